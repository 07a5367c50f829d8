//! Request list table renderer.
//!
//! Columns: METHOD, STATUS, NAME (flexible), TYPE, SIZE, TIME. The selected
//! row is drawn with the selection colors across its full width; other rows
//! color the method and status columns and highlight fuzzy matches in NAME.

use super::Rect;
use crate::ui::helpers::{self, fit, fit_right, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::DisplayRow;

const METHOD_W: usize = 7;
const STATUS_W: usize = 6;
const TYPE_W: usize = 10;
const SIZE_W: usize = 9;
const TIME_W: usize = 8;
/// Fixed columns plus their single-space separators.
const FIXED_W: usize = METHOD_W + STATUS_W + TYPE_W + SIZE_W + TIME_W + 5;

fn name_width(width: usize) -> usize {
    width.saturating_sub(FIXED_W).max(4)
}

/// Renders the column headers at `row`.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_table_headers(out: &mut String, row: usize, area: Rect, theme: &Theme) -> usize {
    let line = format!(
        "{} {} {} {} {} {}",
        fit("METHOD", METHOD_W),
        fit("STATUS", STATUS_W),
        fit("NAME", name_width(area.width)),
        fit("TYPE", TYPE_W),
        fit_right("SIZE", SIZE_W),
        fit_right("TIME", TIME_W),
    );
    position_cursor(out, row, area.col);
    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.header_fg));
    out.push_str(&fit(&line, area.width));
    out.push_str(Theme::reset());
    row + 1
}

/// Renders `rows` starting at `row`, one line each.
///
/// # Returns
///
/// The next available row position
pub fn render_table_rows(out: &mut String, row: usize, area: Rect, rows: &[DisplayRow], theme: &Theme) -> usize {
    let mut current_row = row;
    for item in rows {
        current_row = render_table_row(out, current_row, area, item, theme);
    }
    current_row
}

fn render_table_row(out: &mut String, row: usize, area: Rect, item: &DisplayRow, theme: &Theme) -> usize {
    let data = &item.row;
    let name_w = name_width(area.width);
    position_cursor(out, row, area.col);

    let base = if item.is_selected {
        format!("{}{}", Theme::fg(&theme.colors.selection_fg), Theme::bg(&theme.colors.selection_bg))
    } else {
        Theme::fg(&theme.colors.text_normal)
    };
    let colored = |out: &mut String, color: &str, text: String| {
        if item.is_selected {
            out.push_str(&text);
        } else {
            out.push_str(&Theme::fg(color));
            out.push_str(&text);
            out.push_str(&base);
        }
    };

    out.push_str(&base);
    colored(out, &theme.colors.method_fg, fit(&data.method, METHOD_W));
    out.push(' ');
    colored(
        out,
        theme.status_color(data.status_code, data.failed),
        fit(&data.status, STATUS_W),
    );
    out.push(' ');

    let name = fit(&data.name, name_w);
    if data.failed && !item.is_selected {
        colored(out, &theme.colors.error, name);
    } else {
        let visible = data.name.chars().count().min(name_w);
        let ranges: Vec<(usize, usize)> = data
            .highlight
            .iter()
            .filter(|(start, _)| *start < visible)
            .map(|&(start, end)| (start, end.min(visible)))
            .collect();
        helpers::render_highlighted_text(out, &name, &ranges, theme, item.is_selected);
        if !item.is_selected {
            out.push_str(&base);
        }
    }
    out.push(' ');

    let tail = format!(
        "{} {} {}",
        fit(&data.kind, TYPE_W),
        fit_right(&data.size, SIZE_W),
        fit_right(&data.time, TIME_W)
    );
    if item.is_selected {
        out.push_str(&tail);
    } else {
        colored(out, &theme.colors.text_dim, tail);
    }
    let used = METHOD_W + STATUS_W + name_w + TYPE_W + SIZE_W + TIME_W + 5;
    out.push_str(&" ".repeat(area.width.saturating_sub(used)));
    out.push_str(Theme::reset());
    row + 1
}
