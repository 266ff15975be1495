//! # Introduction
//!
//! memsim simulates the logical address space of a process: one flat 32-bit
//! range split into text, BSS, data, dynamic and stack regions. The dynamic
//! region is a binary buddy allocator, and processes loaded from the same
//! program share their text, BSS and DATA images through a reference-counted
//! segment.
//!
//! ## Pipeline
//!
//! ```text
//! Declaration file → Lexer → Segment registry → AddressSpace → Dump / TUI
//! ```
//!
//! 1. [`loader`]: lexes the five-line declaration format and builds an
//!    [`memory::AddressSpace`], attaching to a live segment when one exists.
//! 2. [`memory`]: values, the bounded stack, the buddy allocator, shared
//!    segments and logical address translation.
//! 3. [`dump`]: plain-text report of one address space.
//! 4. [`ui`]: ratatui-based viewer; not part of the stable library API.
//! 5. [`config`] and [`logging`]: command line, sizing and the stderr logger.
//!
//! ## Logical layout
//!
//! | Region  | Start        |
//! |---------|--------------|
//! | TEXT    | `0x1`        |
//! | BSS     | `0xFFFF`     |
//! | DATA    | `0x1FFFE`    |
//! | DYNAMIC | `0x3FFFC`    |
//! | STACK   | `0x8001FFFD` |

pub mod config;
pub mod dump;
pub mod loader;
pub mod logging;
pub mod memory;
pub mod ui;
