//! Error types for the memory model
//!
//! [`MemoryError`] covers every failure the stack, the buddy allocator and the
//! address-translation layer can report. All of them are returned to the
//! caller; none leaves the model in a partially-updated state.

use super::layout::{Address, Region};
use thiserror::Error;

/// Errors raised by the simulated memory regions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The allocator has no free block large enough
    #[error("Out of memory: cannot satisfy a request of {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Allocation request of zero or negative size
    #[error("Invalid allocation size: {requested} (must be positive)")]
    InvalidAllocationSize { requested: i64 },

    /// Arena size is not a non-zero power of two
    #[error("Invalid arena size: {size} (must be a non-zero power of two)")]
    InvalidArenaSize { size: usize },

    /// Attempted to split a used, already-split or unit-sized block
    #[error("Invalid block split at offset {offset} (size {size})")]
    InvalidSplit { offset: usize, size: usize },

    /// Free of an offset that is not the start of an allocated block
    #[error("Invalid free: no allocated block at offset {offset}")]
    InvalidFree { offset: usize },

    /// No allocated block starts at the given offset
    #[error("No allocated block at offset {offset}")]
    NotAllocated { offset: usize },

    #[error("Stack overflow: capacity is {capacity}")]
    StackOverflow { capacity: usize },

    #[error("Stack underflow")]
    StackUnderflow,

    /// Index past the current extent of a region
    #[error("Index {index} out of bounds for {region} region of extent {extent}")]
    IndexOutOfBounds {
        region: Region,
        index: usize,
        extent: usize,
    },

    /// Logical address below the start of the text region
    #[error("Null pointer access at address 0x{address:x}")]
    NullPointerAccess { address: Address },

    /// Region contents would run past the start of the next region
    #[error("{region} region of {len} units exceeds its maximum of {max}")]
    RegionTooLarge { region: Region, len: u64, max: u64 },

    #[error("Region {region} is read-only")]
    ReadOnlyRegion { region: Region },

    /// Value written to a byte region, or byte written to a value region
    #[error("Cannot store {expected} data in the {region} region")]
    RegionMismatch {
        region: Region,
        expected: &'static str,
    },
}
