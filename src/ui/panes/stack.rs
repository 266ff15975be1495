//! Stack pane rendering
//!
//! Shows the live stack slots top first, each with its logical address,
//! value and kind. The top of the stack is marked.

use super::utils::{pane_block, placeholder_line, slot_line, visible_items};
use crate::memory::layout::Region;
use crate::memory::AddressSpace;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    space: &AddressSpace,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let stack = space.stack();
    let block = pane_block(
        format!(" Stack ({}/{}) ", stack.len(), stack.capacity()),
        is_focused,
    );

    let items: Vec<ListItem> = if stack.is_empty() {
        vec![ListItem::new(placeholder_line("(empty)"))]
    } else {
        let addresses = space.addresses(Region::Stack);
        let top = addresses.len() - 1;
        addresses
            .into_iter()
            .enumerate()
            .rev()
            .map(|(depth, address)| {
                let marker = if depth == top {
                    Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary))
                } else {
                    Span::raw("  ")
                };
                let mut spans = vec![marker];
                spans.extend(slot_line(space, address).spans);
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let list = List::new(visible_items(items, area, scroll_offset)).block(block);
    frame.render_widget(list, area);
}
