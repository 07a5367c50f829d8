//! Search bar component renderer.

use crate::ui::helpers::{fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::SearchBarInfo;

/// Horizontal margin for the search box (spaces on left and right).
const SEARCH_BOX_MARGIN: usize = 1;

/// Renders the search input box at the specified row.
///
/// # Returns
///
/// The next available row position (row + 3, since the box uses 3 lines)
///
/// # Layout
///
/// ```text
/// [margin] ┌─────────────┐ [margin]
/// [margin] │ Search: ... │ [margin]
/// [margin] └─────────────┘ [margin]
/// ```
///
/// The border is dimmed when the box does not have input focus.
pub fn render_search_bar(out: &mut String, row: usize, search: &SearchBarInfo, theme: &Theme, cols: usize) -> usize {
    let box_width = cols.saturating_sub(SEARCH_BOX_MARGIN * 2);
    let inner_width = box_width.saturating_sub(2);
    let margin = " ".repeat(SEARCH_BOX_MARGIN);
    let border = if search.editing {
        Theme::fg(&theme.colors.search_bar_border)
    } else {
        Theme::fg(&theme.colors.border)
    };

    position_cursor(out, row, 1);
    out.push_str(&margin);
    out.push_str(&border);
    out.push_str(&format!("┌{}┐", "─".repeat(inner_width)));
    out.push_str(Theme::reset());
    out.push_str(&margin);

    let cursor = if search.editing { "▏" } else { "" };
    let search_text = format!(" Search: {}{cursor}", search.query);

    position_cursor(out, row + 1, 1);
    out.push_str(&margin);
    out.push_str(&border);
    out.push('│');
    out.push_str(&Theme::fg(&theme.colors.text_normal));
    out.push_str(&fit(&search_text, inner_width));
    out.push_str(&border);
    out.push('│');
    out.push_str(Theme::reset());
    out.push_str(&margin);

    position_cursor(out, row + 2, 1);
    out.push_str(&margin);
    out.push_str(&border);
    out.push_str(&format!("└{}┘", "─".repeat(inner_width)));
    out.push_str(Theme::reset());
    out.push_str(&margin);

    row + 3
}
