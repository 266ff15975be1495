//! Text, BSS and DATA pane rendering
//!
//! The text and data headings carry the list of other processes attached to
//! the same segment.

use super::utils::{heading_line, pane_block, placeholder_line, slot_line, visible_items};
use crate::dump::shared_note;
use crate::memory::layout::Region;
use crate::memory::AddressSpace;
use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{List, ListItem},
    Frame,
};

/// Render the static segments pane
pub fn render_segments_pane(
    frame: &mut Frame,
    area: Rect,
    space: &AddressSpace,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(format!(" Segments: {} ", space.segment().source()), is_focused);
    let note = shared_note(space);

    let mut items: Vec<ListItem> = Vec::new();
    for (i, region) in [Region::Text, Region::Bss, Region::Data].into_iter().enumerate() {
        if i > 0 {
            items.push(ListItem::new(Line::default()));
        }
        let heading_note = match region {
            Region::Text | Region::Data => note.clone(),
            _ => None,
        };
        items.push(ListItem::new(heading_line(region.name(), heading_note)));

        let addresses = space.addresses(region);
        if addresses.is_empty() {
            items.push(ListItem::new(placeholder_line("(empty)")));
        }
        items.extend(
            addresses
                .into_iter()
                .map(|address| ListItem::new(slot_line(space, address))),
        );
    }

    let list = List::new(visible_items(items, area, scroll_offset)).block(block);
    frame.render_widget(list, area);
}
