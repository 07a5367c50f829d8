//! Empty state component renderer.

use super::Rect;
use crate::ui::helpers::{fit, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

fn centered(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let len = text.chars().count();
    let padding = width.saturating_sub(len) / 2;
    fit(&format!("{}{text}", " ".repeat(padding)), width)
}

/// Renders a two-line centered message a few rows into `area`.
///
/// The message uses `empty_state_fg`, the subtitle is dimmed.
pub fn render_empty_state(out: &mut String, area: Rect, empty: &EmptyState, theme: &Theme) {
    if area.height < 2 {
        return;
    }
    let top = area.row + (area.height / 3).min(4);

    position_cursor(out, top, area.col);
    out.push_str(&Theme::fg(&theme.colors.empty_state_fg));
    out.push_str(&centered(&empty.message, area.width));
    out.push_str(Theme::reset());

    position_cursor(out, top + 1, area.col);
    out.push_str(Theme::dim());
    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(&centered(&empty.subtitle, area.width));
    out.push_str(Theme::reset());
}
