//! Plain-text address space report
//!
//! Every line is produced by reading through [`AddressSpace::load`], so the
//! report shows exactly what a logical address resolves to.
//!
//! ```text
//! ------------------------------PROCESS1 ADDRESS SPACE------------------------------
//! TEXT REGION INFO (SHARED WITH PROCESS2):
//!
//! [...]
//! [0x1] - [0x10]
//! [...]
//! ```

use crate::memory::buddy::BuddyAllocator;
use crate::memory::layout::{Address, Region};
use crate::memory::{AddressSpace, MemoryError, Slot};

const BANNER_RULE: &str = "------------------------------";
const ELLIPSIS: &str = "[...]";

/// `(SHARED WITH PROCESSx, ...)` when other processes use the same segment
pub fn shared_note(space: &AddressSpace) -> Option<String> {
    let others = space.shared_with();
    if others.is_empty() {
        return None;
    }
    let names: Vec<String> = others.iter().map(ToString::to_string).collect();
    Some(format!("(SHARED WITH {})", names.join(", ")))
}

/// One `[0xADDR] - [...]` line per unit of `region`
pub fn region_lines(space: &AddressSpace, region: Region) -> Result<Vec<String>, MemoryError> {
    space
        .addresses(region)
        .into_iter()
        .map(|address| entry_line(space, address))
        .collect()
}

fn entry_line(space: &AddressSpace, address: Address) -> Result<String, MemoryError> {
    let body = match space.load(address)? {
        Slot::Text(byte) => format!("0x{:x}", byte),
        Slot::Bss(value) | Slot::Data(value) | Slot::Stack(value) => value.to_string(),
        Slot::Dynamic(_) => format!(
            "ALLOCATED TO ALLOW {} BYTES AT THIS ADDRESS",
            space.requested_size(address)?
        ),
    };
    Ok(format!("[0x{:x}] - [{}]", address, body))
}

/// Free lists per level, in list order; numbers are arena offsets
pub fn buddy_layout(heap: &BuddyAllocator) -> Vec<String> {
    (0..heap.level_count())
        .map(|level| {
            let blocks: Vec<String> = heap
                .level(level)
                .map(|block| {
                    format!(
                        "[{}, Size: {}, {}]",
                        block.offset,
                        block.size,
                        if block.free { "FREE" } else { "TAKEN" }
                    )
                })
                .collect();
            if blocks.is_empty() {
                format!("[{}] - None", level)
            } else {
                format!("[{}] - {}", level, blocks.join(" "))
            }
        })
        .collect()
}

/// Render the full report for one address space
pub fn render(space: &AddressSpace) -> Result<String, MemoryError> {
    let note = shared_note(space)
        .map(|n| format!(" {}", n))
        .unwrap_or_default();
    let mut out = Vec::new();

    out.push(format!(
        "{}{} ADDRESS SPACE{}",
        BANNER_RULE,
        space.pid(),
        BANNER_RULE
    ));

    out.push(format!("TEXT REGION INFO{}:", note));
    out.push(String::new());
    push_section(&mut out, region_lines(space, Region::Text)?);

    out.push(String::new());
    out.push(format!("DATA REGION INFO{}:", note));
    out.push(String::new());
    out.push("--------------BSS--------------".to_string());
    push_section(&mut out, region_lines(space, Region::Bss)?);
    out.push("-------------DATA--------------".to_string());
    push_section(&mut out, region_lines(space, Region::Data)?);

    out.push(String::new());
    out.push("DYNAMIC REGION INFO:".to_string());
    out.push(String::new());
    out.push("BUDDY LAYOUT (NUMBERS ARE OFFSETS):".to_string());
    out.extend(buddy_layout(space.heap()));
    push_section(&mut out, region_lines(space, Region::Dynamic)?);

    out.push(String::new());
    out.push("STACK REGION INFO:".to_string());
    out.push(String::new());
    push_section(&mut out, region_lines(space, Region::Stack)?);

    let mut text = out.join("\n");
    text.push('\n');
    Ok(text)
}

fn push_section(out: &mut Vec<String>, lines: Vec<String>) {
    out.push(ELLIPSIS.to_string());
    out.extend(lines);
    out.push(ELLIPSIS.to_string());
}
