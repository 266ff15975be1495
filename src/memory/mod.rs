//! Memory model for the address-space simulator
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Typed scalar values (Float, Int, Char, String, Byte, None)
//! - [`stack`]: Fixed-capacity value stack for the STACK region
//! - [`buddy`]: Buddy-system allocator for the DYNAMIC region
//! - [`segment`]: Shared TEXT/BSS/DATA descriptors and their registry
//! - [`address_space`]: One process, with logical address translation
//! - [`layout`]: Region boundaries and address translation helpers
//! - [`errors`]: The [`MemoryError`] type
//!
//! # Sharing Model
//!
//! Processes loaded from the same source share one [`SharedSegment`] through
//! an `Rc`. The text bytes are read in place; BSS and DATA are copied into a
//! private array per process, so writes never leak between processes.
//!
//! [`MemoryError`]: errors::MemoryError
//! [`SharedSegment`]: segment::SharedSegment

pub mod address_space;
pub mod buddy;
pub mod errors;
pub mod layout;
pub mod segment;
pub mod stack;
pub mod value;

pub use address_space::{AddressSpace, Slot};
pub use errors::MemoryError;
pub use segment::{ProcessId, SegmentRegistry, SharedSegment};
pub use value::{Value, ValueKind, ValueRef};
