//! Detail pane renderer: tab bar, optional search prompt, then the lines of
//! the active pane.

use super::Rect;
use crate::ui::helpers::{fit, position_cursor, render_highlighted_text, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{DetailLine, DetailView, LineKind};

fn render_tabs(out: &mut String, row: usize, area: Rect, view: &DetailView, theme: &Theme) {
    position_cursor(out, row, area.col);
    let mut used = 0;
    for (pane, active) in &view.tabs {
        let text = format!(" {} ", pane.label());
        used += text.chars().count();
        if *active {
            out.push_str(Theme::bold());
            if view.focused {
                out.push_str(&Theme::fg(&theme.colors.selection_fg));
                out.push_str(&Theme::bg(&theme.colors.accent));
            } else {
                out.push_str(&Theme::fg(&theme.colors.accent));
            }
        } else {
            out.push_str(&Theme::fg(&theme.colors.text_dim));
        }
        out.push_str(&text);
        out.push_str(Theme::reset());
    }
    out.push_str(&" ".repeat(area.width.saturating_sub(used)));
}

fn render_line(out: &mut String, line: &DetailLine, width: usize, theme: &Theme) {
    let text = fit(&line.text, width);
    if line.is_cursor {
        out.push_str(&Theme::fg(&theme.colors.selection_fg));
        out.push_str(&Theme::bg(&theme.colors.selection_bg));
        render_highlighted_text(out, &text, &line.matches, theme, true);
        out.push_str(Theme::reset());
        return;
    }
    match line.kind {
        LineKind::Heading => {
            out.push_str(Theme::bold());
            out.push_str(&Theme::fg(&theme.colors.accent));
            render_highlighted_text(out, &text, &line.matches, theme, false);
        }
        LineKind::Field { name_len } if line.matches.is_empty() => {
            let split = text.char_indices().nth(name_len).map_or(text.len(), |(i, _)| i);
            out.push_str(&Theme::fg(&theme.colors.method_fg));
            out.push_str(&text[..split]);
            out.push_str(&Theme::fg(&theme.colors.text_normal));
            out.push_str(&text[split..]);
        }
        LineKind::Field { .. } | LineKind::Plain => {
            out.push_str(&Theme::fg(&theme.colors.text_normal));
            render_highlighted_text(out, &text, &line.matches, theme, false);
        }
    }
    out.push_str(Theme::reset());
}

/// Renders the detail pane into `area`, filling every row.
pub fn render_detail(out: &mut String, area: Rect, view: &DetailView, theme: &Theme) {
    if area.height == 0 {
        return;
    }
    render_tabs(out, area.row, area, view, theme);
    let mut row = area.row + 1;
    let bottom = area.row + area.height;

    if let Some(prompt) = &view.search_prompt {
        if row < bottom {
            position_cursor(out, row, area.col);
            out.push_str(&Theme::fg(&theme.colors.search_bar_border));
            out.push_str(&fit(prompt, area.width));
            out.push_str(Theme::reset());
            row += 1;
        }
    }

    if let Some(placeholder) = &view.placeholder {
        if row < bottom {
            position_cursor(out, row, area.col);
            out.push_str(&Theme::fg(&theme.colors.text_dim));
            out.push_str(&fit(&format!(" {}", truncate(placeholder, area.width)), area.width));
            out.push_str(Theme::reset());
            row += 1;
        }
    } else {
        for line in &view.lines {
            if row >= bottom {
                break;
            }
            position_cursor(out, row, area.col);
            render_line(out, line, area.width, theme);
            row += 1;
        }
    }

    while row < bottom {
        position_cursor(out, row, area.col);
        out.push_str(&" ".repeat(area.width));
        row += 1;
    }
}
