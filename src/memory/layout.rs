//! Logical address layout
//!
//! The simulated process sees one flat 32-bit address range split into five
//! ordered regions. Padding between the regions leaves room for growth.
//!
//! ```text
//! 0x00000000            null
//! 0x00000001  TEXT      shared code bytes
//! 0x0000FFFF  BSS       uninitialised statics
//! 0x0001FFFE  DATA      initialised statics
//! 0x0003FFFC  DYNAMIC   buddy-allocated heap
//! 0x8001FFFD  STACK     bounded value stack
//! ```

use std::fmt;

/// Logical address type (32-bit)
pub type Address = u32;

pub const TEXT_START: Address = 0x1;
pub const BSS_START: Address = 0xFFFF;
pub const DATA_START: Address = 0x1FFFE;
pub const DYNAMIC_START: Address = 0x3FFFC;
pub const STACK_START: Address = 0x8001_FFFD;

/// Default number of stack slots
pub const DEFAULT_STACK_SIZE: usize = 256;

/// Default heap arena size in bytes (2^14)
pub const DEFAULT_HEAP_SIZE: usize = 2048 * 8;

/// Largest power-of-two arena that fits below [`STACK_START`] (2^30)
pub const MAX_HEAP_SIZE: usize = 1 << 30;

/// One of the five logical regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Text,
    Bss,
    Data,
    Dynamic,
    Stack,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Text,
        Region::Bss,
        Region::Data,
        Region::Dynamic,
        Region::Stack,
    ];

    /// First logical address of the region
    pub fn start(self) -> Address {
        match self {
            Region::Text => TEXT_START,
            Region::Bss => BSS_START,
            Region::Data => DATA_START,
            Region::Dynamic => DYNAMIC_START,
            Region::Stack => STACK_START,
        }
    }

    /// One past the last logical address the region may ever occupy
    pub fn limit(self) -> u64 {
        match self {
            Region::Text => BSS_START as u64,
            Region::Bss => DATA_START as u64,
            Region::Data => DYNAMIC_START as u64,
            Region::Dynamic => STACK_START as u64,
            Region::Stack => Address::MAX as u64 + 1,
        }
    }

    /// Number of addressable units between the region start and its limit
    pub fn capacity(self) -> u64 {
        self.limit() - self.start() as u64
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Text => "TEXT",
            Region::Bss => "BSS",
            Region::Data => "DATA",
            Region::Dynamic => "DYNAMIC",
            Region::Stack => "STACK",
        }
    }

    /// Logical address of the `index`-th unit of the region
    pub fn address_of(self, index: usize) -> Address {
        self.start().wrapping_add(index as Address)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a logical address into its region and the index local to it.
///
/// Returns `None` for addresses below [`TEXT_START`].
pub fn translate(address: Address) -> Option<(Region, usize)> {
    let region = match address {
        a if a < TEXT_START => return None,
        a if a < BSS_START => Region::Text,
        a if a < DATA_START => Region::Bss,
        a if a < DYNAMIC_START => Region::Data,
        a if a < STACK_START => Region::Dynamic,
        _ => Region::Stack,
    };
    Some((region, (address - region.start()) as usize))
}
