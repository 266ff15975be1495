//! Main TUI application state and logic

use crate::memory::AddressSpace;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Segments,
    Heap,
    Stack,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: segments -> heap -> stack)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Segments => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Segments,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Segments => FocusedPane::Stack,
            FocusedPane::Heap => FocusedPane::Segments,
            FocusedPane::Stack => FocusedPane::Heap,
        }
    }
}

/// The main application state
pub struct App<'a> {
    /// Loaded address spaces, in load order
    pub spaces: &'a [AddressSpace],

    /// Index of the displayed address space
    pub current: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub segments_scroll: usize,
    pub heap_scroll: usize,
    pub stack_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl<'a> App<'a> {
    pub fn new(spaces: &'a [AddressSpace]) -> Self {
        App {
            spaces,
            current: 0,
            focused_pane: FocusedPane::Segments,
            segments_scroll: 0,
            heap_scroll: 0,
            stack_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key_event(key);
                }
            }
        }
        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let spaces = self.spaces;
        let Some(space) = spaces.get(self.current) else {
            return;
        };
        let size = frame.area();

        // Panes on top, status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Segments (left) | Dynamic over Stack (right)
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main_chunks[0]);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[1]);

        super::panes::render_segments_pane(
            frame,
            columns[0],
            space,
            self.focused_pane == FocusedPane::Segments,
            &mut self.segments_scroll,
        );

        super::panes::render_heap_pane(
            frame,
            right_rows[0],
            space,
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        super::panes::render_stack_pane(
            frame,
            right_rows[1],
            space,
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            space.pid(),
            self.current,
            spaces.len(),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => self.select(self.current.checked_sub(1)),
            KeyCode::Right => self.select(Some(self.current + 1)),
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Segments => &mut self.segments_scroll,
            FocusedPane::Heap => &mut self.heap_scroll,
            FocusedPane::Stack => &mut self.stack_scroll,
        }
    }

    /// Switch to another process, resetting scroll positions
    fn select(&mut self, index: Option<usize>) {
        match index.filter(|&i| i < self.spaces.len()) {
            Some(i) => {
                self.current = i;
                self.segments_scroll = 0;
                self.heap_scroll = 0;
                self.stack_scroll = 0;
                if let Some(space) = self.spaces.get(i) {
                    self.status_message = format!("Viewing {}", space.pid());
                }
            }
            None => {
                self.status_message = "No more processes in that direction".to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpaceConfig;
    use crate::loader::load_str;
    use crate::memory::{ProcessId, SegmentRegistry};
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn spaces() -> Vec<AddressSpace> {
        let mut registry = SegmentRegistry::new();
        let config = SpaceConfig::default();
        (0..3)
            .map(|_| load_str("p", "1, 2\n16\n", &mut registry, &config).unwrap())
            .collect()
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(FocusedPane::Segments.next().next().next(), FocusedPane::Segments);
        assert_eq!(FocusedPane::Segments.prev(), FocusedPane::Stack);
    }

    #[test]
    fn test_switch_process_and_reset_scroll() {
        let spaces = spaces();
        let mut app = App::new(&spaces);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.segments_scroll, 2);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.current, 1);
        assert_eq!(app.segments_scroll, 0);
        assert_eq!(app.status_message, format!("Viewing {}", ProcessId(2)));

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current, 2);

        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.current, 0);
    }

    #[test]
    fn test_scroll_follows_focus_and_quit() {
        let spaces = spaces();
        let mut app = App::new(&spaces);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Heap);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.heap_scroll, 0);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.stack_scroll, 1);
        assert_eq!(app.segments_scroll, 0);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
