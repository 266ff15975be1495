//! Dynamic region pane rendering
//!
//! Two sections: the buddy free lists per level, in list order, and the
//! allocated blocks with the size recorded in their header.

use super::utils::{heading_line, pane_block, placeholder_line, slot_line, visible_items};
use crate::memory::buddy::{BuddyAllocator, BuddyBlock};
use crate::memory::layout::Region;
use crate::memory::AddressSpace;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Render the dynamic region pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    space: &AddressSpace,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let heap = space.heap();
    let block = pane_block(
        format!(" Dynamic ({} of {} bytes free) ", heap.free_bytes(), heap.size()),
        is_focused,
    );

    let mut items: Vec<ListItem> = vec![ListItem::new(heading_line("BUDDY LAYOUT", None))];
    items.extend(level_lines(heap).into_iter().map(ListItem::new));

    items.push(ListItem::new(Line::default()));
    items.push(ListItem::new(heading_line("ALLOCATIONS", None)));
    let addresses = space.addresses(Region::Dynamic);
    if addresses.is_empty() {
        items.push(ListItem::new(placeholder_line("(none)")));
    } else {
        items.extend(
            addresses
                .into_iter()
                .map(|address| ListItem::new(slot_line(space, address))),
        );
    }

    let list = List::new(visible_items(items, area, scroll_offset)).block(block);
    frame.render_widget(list, area);
}

/// Non-empty levels, largest block size first
fn level_lines(heap: &BuddyAllocator) -> Vec<Line<'static>> {
    (0..heap.level_count())
        .rev()
        .filter_map(|level| {
            let blocks: Vec<&BuddyBlock> = heap.level(level).collect();
            if blocks.is_empty() {
                return None;
            }
            let mut spans = vec![Span::styled(
                format!("{:>6} ", 1usize << level),
                Style::default().fg(DEFAULT_THEME.comment),
            )];
            spans.extend(blocks.into_iter().map(block_span));
            Some(Line::from(spans))
        })
        .collect()
}

fn block_span(block: &BuddyBlock) -> Span<'static> {
    let style = if block.is_available() {
        Style::default().fg(DEFAULT_THEME.success)
    } else if block.is_allocated() {
        Style::default()
            .fg(DEFAULT_THEME.error)
            .add_modifier(Modifier::BOLD)
    } else {
        // Split parent
        Style::default()
            .fg(DEFAULT_THEME.comment)
            .add_modifier(Modifier::DIM)
    };
    Span::styled(format!("[{}] ", block.offset), style)
}
