//! Shared helpers for pane rendering: borders, scrolling, value styling

use crate::memory::layout::Address;
use crate::memory::{AddressSpace, Slot, Value};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem},
};

/// Bordered block with the focus-dependent border style
pub(crate) fn pane_block(title: String, is_focused: bool) -> Block<'static> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Clamp `scroll_offset` and return the items that fit inside `area`
pub(crate) fn visible_items(
    items: Vec<ListItem<'static>>,
    area: Rect,
    scroll_offset: &mut usize,
) -> Vec<ListItem<'static>> {
    let total_items = items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

    // Clamp scroll offset only if content exceeds visible area
    if total_items > visible_height {
        *scroll_offset = (*scroll_offset).min(total_items - visible_height);
    } else {
        *scroll_offset = 0;
    }

    items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect()
}

/// Format a value with styled spans
pub(crate) fn format_value_styled(value: &Value) -> Span<'static> {
    match value {
        Value::Int(_) | Value::Float(_) => {
            Span::styled(value.to_string(), Style::default().fg(DEFAULT_THEME.number))
        }
        Value::Char(c) => Span::styled(format!("'{}'", c), Style::default().fg(DEFAULT_THEME.string)),
        Value::Str(s) => Span::styled(format!("\"{}\"", s), Style::default().fg(DEFAULT_THEME.string)),
        Value::Byte(_) => Span::styled(value.to_string(), Style::default().fg(DEFAULT_THEME.byte)),
        Value::None => Span::styled(
            "NULL",
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::DIM),
        ),
    }
}

pub(crate) fn address_span(address: Address) -> Span<'static> {
    Span::styled(
        format!("0x{:08x}", address),
        Style::default().fg(DEFAULT_THEME.address),
    )
}

/// Kind annotation shown after a value, e.g. `INT`
pub(crate) fn kind_span(value: &Value) -> Span<'static> {
    Span::styled(
        format!("  {}", value.kind().name()),
        Style::default().fg(DEFAULT_THEME.comment),
    )
}

/// One `address  value  KIND` row, read through the address space
pub(crate) fn slot_line(space: &AddressSpace, address: Address) -> Line<'static> {
    let mut spans = vec![address_span(address), Span::raw("  ")];
    match space.load(address) {
        Ok(Slot::Text(byte)) => spans.push(Span::styled(
            format!("0x{:02x}", byte),
            Style::default().fg(DEFAULT_THEME.byte),
        )),
        Ok(Slot::Dynamic(_)) => match space.requested_size(address) {
            Ok(size) => spans.push(Span::styled(
                format!("{} bytes requested", size),
                Style::default().fg(DEFAULT_THEME.number),
            )),
            Err(e) => spans.push(error_span(e.to_string())),
        },
        Ok(slot) => {
            if let Some(value) = slot.value() {
                spans.push(format_value_styled(value));
                spans.push(kind_span(value));
            }
        }
        Err(e) => spans.push(error_span(e.to_string())),
    }
    Line::from(spans)
}

pub(crate) fn heading_line(title: &str, note: Option<String>) -> Line<'static> {
    let mut spans = vec![Span::styled(
        title.to_string(),
        Style::default()
            .fg(DEFAULT_THEME.region_name)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(note) = note {
        spans.push(Span::styled(
            format!(" {}", note),
            Style::default().fg(DEFAULT_THEME.secondary),
        ));
    }
    Line::from(spans)
}

pub(crate) fn placeholder_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", text),
        Style::default().fg(DEFAULT_THEME.comment),
    ))
}

fn error_span(message: String) -> Span<'static> {
    Span::styled(message, Style::default().fg(DEFAULT_THEME.error))
}
