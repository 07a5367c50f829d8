//! Status line and footer renderers.

use crate::store::StatusMessage;
use crate::ui::helpers::{fit, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::FooterInfo;

/// Renders the status message line (blank when there is no message).
pub fn render_status(out: &mut String, row: usize, status: Option<&StatusMessage>, theme: &Theme, cols: usize) -> usize {
    position_cursor(out, row, 1);
    match status {
        Some(message) => {
            out.push_str(&Theme::fg(theme.message_color(message.class)));
            out.push_str(&fit(&format!(" {}", message.text), cols));
            out.push_str(Theme::reset());
        }
        None => out.push_str(&" ".repeat(cols)),
    }
    row + 1
}

/// Renders the footer help bar at the specified row.
///
/// Keybinding hints are centered and dimmed; text wider than the terminal
/// is truncated so it never wraps.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_footer(out: &mut String, row: usize, footer: &FooterInfo, theme: &Theme, cols: usize) -> usize {
    let help_text = truncate(&footer.keybindings, cols);
    let text_len = help_text.chars().count();
    let padding = (cols.saturating_sub(text_len)) / 2;

    position_cursor(out, row, 1);
    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(&" ".repeat(padding));
    out.push_str(&help_text);
    out.push_str(&" ".repeat(cols.saturating_sub(padding + text_len)));
    out.push_str(Theme::reset());
    row + 1
}
