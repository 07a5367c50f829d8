//! COPY mode menu, drawn as a box over the body.

use super::Rect;
use crate::ui::helpers::{fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::CopyMenu;

const MENU_WIDTH: usize = 30;

/// Renders the menu centered in `area`.
pub fn render_copy_menu(out: &mut String, area: Rect, menu: &CopyMenu, theme: &Theme) {
    let width = MENU_WIDTH.min(area.width);
    let height = menu.entries.len() + 2;
    if width < 8 || area.height < height {
        return;
    }
    let inner = width - 2;
    let col = area.col + (area.width - width) / 2;
    let top = area.row + (area.height - height) / 2;
    let border = Theme::fg(&theme.colors.search_bar_border);

    position_cursor(out, top, col);
    out.push_str(&border);
    out.push_str(&format!("┌{}┐", fit(" Copy ", inner).replace(' ', "─")));

    for (i, (key, label, highlighted)) in menu.entries.iter().enumerate() {
        position_cursor(out, top + 1 + i, col);
        out.push_str(&border);
        out.push('│');
        if *highlighted {
            out.push_str(&Theme::fg(&theme.colors.selection_fg));
            out.push_str(&Theme::bg(&theme.colors.selection_bg));
        } else {
            out.push_str(&Theme::fg(&theme.colors.text_normal));
        }
        out.push_str(&fit(&format!(" {key}  {label}"), inner));
        out.push_str(Theme::reset());
        out.push_str(&border);
        out.push('│');
    }

    position_cursor(out, top + height - 1, col);
    out.push_str(&format!("└{}┘", "─".repeat(inner)));
    out.push_str(Theme::reset());
}
