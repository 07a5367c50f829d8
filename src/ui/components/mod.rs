//! Composable UI component renderers.
//!
//! Each component appends one part of the frame to a `String` buffer and
//! returns the next free row where that makes sense.
//!
//! # Components
//!
//! - [`header`]: Title, mode badge, counts and capture state
//! - [`search`]: Request search box
//! - [`chips`]: Resource-type filter chips
//! - [`table`]: Request list (METHOD, STATUS, NAME, TYPE, SIZE, TIME)
//! - [`detail`]: Tabs and lines of the detail pane
//! - [`copy_menu`]: COPY mode overlay
//! - [`empty`]: Empty list message
//! - [`footer`]: Status line and keybinding hints

mod chips;
mod copy_menu;
mod detail;
mod empty;
mod footer;
mod header;
mod search;
mod table;

pub use chips::render_chips;
pub use copy_menu::render_copy_menu;
pub use detail::render_detail;
pub use empty::render_empty_state;
pub use footer::{render_footer, render_status};
pub use header::render_header;
pub use search::render_search_bar;

use crate::ui::helpers::position_cursor;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::ListView;
use table::{render_table_headers, render_table_rows};

/// A screen region; `row` and `col` are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub height: usize,
}

/// Renders a horizontal border line at the specified row.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_border(out: &mut String, row: usize, color: &str, cols: usize) -> usize {
    position_cursor(out, row, 1);
    out.push_str(&Theme::fg(color));
    out.push_str(&"─".repeat(cols));
    out.push_str(Theme::reset());
    row + 1
}

/// Renders a vertical separator of `height` rows starting at `row`.
pub fn render_separator(out: &mut String, row: usize, col: usize, height: usize, color: &str) {
    out.push_str(&Theme::fg(color));
    for r in row..row + height {
        position_cursor(out, r, col);
        out.push('│');
    }
    out.push_str(Theme::reset());
}

/// Renders the request list into `area`: column headers, visible rows, and
/// blank lines below them (or the empty state).
///
/// Returns the height in lines of one painted row, or `None` when no row was
/// painted.
pub fn render_list(out: &mut String, area: Rect, list: &ListView, theme: &Theme) -> Option<usize> {
    if area.height == 0 {
        return None;
    }
    let mut row = render_table_headers(out, area.row, area, theme);
    let body = Rect {
        row,
        height: area.height - 1,
        ..area
    };
    let bottom = area.row + area.height;

    if let Some(empty) = &list.empty_state {
        for r in row..bottom {
            position_cursor(out, r, area.col);
            out.push_str(&" ".repeat(area.width));
        }
        render_empty_state(out, body, empty, theme);
        return None;
    }

    let visible = &list.rows[..list.rows.len().min(body.height)];
    let first = row;
    row = render_table_rows(out, row, area, visible, theme);
    let measured = (!visible.is_empty()).then(|| (row - first) / visible.len());
    while row < bottom {
        position_cursor(out, row, area.col);
        out.push_str(&" ".repeat(area.width));
        row += 1;
    }
    measured
}
