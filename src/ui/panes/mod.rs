//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`segments`]: Text, BSS and DATA regions with sharing annotations
//! - [`heap`]: Buddy layout and allocations of the dynamic region
//! - [`stack`]: Live stack slots, top first
//! - [`status`]: Status bar with keybindings and the selected process
//! - `utils`: Shared helpers for borders, scrolling and value styling
//!
//! Every pane is a stateless `render_*` function that reads the address space
//! through its logical address accessor; only the scroll offset is mutated.

mod utils;

pub mod heap;
pub mod segments;
pub mod stack;
pub mod status;

// Re-export render functions for convenience
pub use heap::render_heap_pane;
pub use segments::render_segments_pane;
pub use stack::render_stack_pane;
pub use status::render_status_bar;
