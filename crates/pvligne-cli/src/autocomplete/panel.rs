//! Suggestion panel geometry: scroll window, placement and hit testing.

use std::ops::Range;

use pvligne_core::config::PanelConfig;
use ratatui::layout::{Margin, Position, Rect};

/// Per-instance panel state. Exists from construction until teardown.
#[derive(Debug, Clone)]
pub struct PanelState {
    visible_rows: usize,
    scroll_offset: usize,
    /// Where the panel was last drawn, set by the renderer.
    area: Option<Rect>,
}

impl PanelState {
    pub fn new(visible_rows: usize) -> Self {
        Self {
            visible_rows: visible_rows.max(1),
            scroll_offset: 0,
            area: None,
        }
    }

    pub const fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub const fn area(&self) -> Option<Rect> {
        self.area
    }

    pub const fn set_area(&mut self, area: Option<Rect>) {
        self.area = area;
    }

    /// Forget scroll position and placement (panel closed or refilled).
    pub const fn reset(&mut self) {
        self.scroll_offset = 0;
        self.area = None;
    }

    /// Adjust the scroll offset so `selected` is visible.
    pub const fn follow(&mut self, selected: usize) {
        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if selected >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = selected + 1 - self.visible_rows;
        }
    }

    /// Candidate indices currently inside the scroll window.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = self.scroll_offset.min(len);
        start..(start + self.visible_rows).min(len)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.area.is_some_and(|a| a.contains(pos))
    }

    /// Candidate index under `pos`, if `pos` is on a row of the list.
    pub fn row_at(&self, pos: Position, len: usize) -> Option<usize> {
        let inner = self.area?.inner(Margin::new(1, 1));
        if !inner.contains(pos) {
            return None;
        }
        let index = self.scroll_offset + usize::from(pos.y - inner.y);
        self.window(len).contains(&index).then_some(index)
    }
}

/// Place the panel under the caret's line in `host`, anchored to its left edge.
///
/// `host` is the text area (inside borders); `content_width` is the widest
/// row to display. When there is no room below, the panel goes above the
/// caret line instead.
pub fn place(
    host: Rect,
    caret_row: u16,
    rows: u16,
    content_width: u16,
    config: &PanelConfig,
    screen: Rect,
) -> Rect {
    let height = rows.saturating_add(2).min(screen.height);
    let x = host.x;
    let width = content_width
        .saturating_add(2)
        .max(config.min_width)
        .min(screen.right().saturating_sub(x));

    let line_y = host.y.saturating_add(caret_row);
    let below = line_y.saturating_add(1).saturating_add(config.margin);
    let y = if below.saturating_add(height) <= screen.bottom() {
        below
    } else {
        line_y
            .saturating_sub(config.margin)
            .saturating_sub(height)
            .max(screen.y)
    };

    Rect::new(x, y, width, height)
}
