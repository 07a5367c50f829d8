//! Resource-type filter chip bar.

use crate::ui::helpers::{position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::ChipInfo;

/// Renders the chips on one line; active chips use the accent color and the
/// chip under the cursor is drawn with the selection colors.
pub fn render_chips(out: &mut String, row: usize, chips: &[ChipInfo], theme: &Theme, cols: usize) -> usize {
    position_cursor(out, row, 1);
    let mut used = 0;
    for chip in chips {
        let text = format!(" {} ", chip.label);
        let len = text.chars().count() + 1;
        if used + len > cols {
            break;
        }
        out.push(' ');
        if chip.under_cursor {
            out.push_str(&Theme::fg(&theme.colors.selection_fg));
            out.push_str(&Theme::bg(&theme.colors.selection_bg));
        } else if chip.active {
            out.push_str(&Theme::fg(&theme.colors.selection_fg));
            out.push_str(&Theme::bg(&theme.colors.accent));
        } else {
            out.push_str(&Theme::fg(&theme.colors.text_dim));
        }
        if chip.active {
            out.push_str(Theme::bold());
        }
        out.push_str(&truncate(&text, cols - used - 1));
        out.push_str(Theme::reset());
        used += len;
    }
    out.push_str(&" ".repeat(cols.saturating_sub(used)));
    row + 1
}
