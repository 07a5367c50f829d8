//! Shared rendering utilities.
//!
//! Every renderer appends to a frame `String` instead of printing, so a frame
//! can be built, inspected in tests, and written to the terminal in one go.
//! Widths are counted in characters, not bytes.

use crate::ui::theme::Theme;
use std::fmt::Write as _;

/// Moves the cursor to `row`, `col` (both 1-indexed).
pub fn position_cursor(out: &mut String, row: usize, col: usize) {
    let _ = write!(out, "\u{1b}[{row};{col}H");
}

/// Cuts `text` to at most `width` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

/// Truncates or right-pads `text` to exactly `width` characters.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let cut = truncate(text, width);
    let len = cut.chars().count();
    format!("{cut}{}", " ".repeat(width.saturating_sub(len)))
}

/// Left-pads `text` to `width` characters (truncating if longer).
#[must_use]
pub fn fit_right(text: &str, width: usize) -> String {
    let cut = truncate(text, width);
    let len = cut.chars().count();
    format!("{}{cut}", " ".repeat(width.saturating_sub(len)))
}

/// Appends `text` with highlighted character ranges for fuzzy matches.
///
/// Ranges are `(start, end)` character indices, end exclusive. When
/// `is_selected` is true the selection colors are restored after each
/// highlighted run so the row background stays continuous.
///
/// # Example
///
/// ```rust
/// use netmodal::ui::helpers::render_highlighted_text;
/// use netmodal::ui::Theme;
///
/// let mut out = String::new();
/// render_highlighted_text(&mut out, "users", &[(0, 2)], &Theme::default(), false);
/// assert!(out.ends_with("ers"));
/// ```
pub fn render_highlighted_text(out: &mut String, text: &str, ranges: &[(usize, usize)], theme: &Theme, is_selected: bool) {
    if ranges.is_empty() {
        out.push_str(text);
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len()).max(current_pos);
        let end = end.min(chars.len());
        if start >= end {
            continue;
        }
        out.extend(&chars[current_pos..start]);

        out.push_str(&Theme::fg(&theme.colors.match_highlight_fg));
        out.push_str(&Theme::bg(&theme.colors.match_highlight_bg));
        out.extend(&chars[start..end]);
        out.push_str(Theme::reset());

        if is_selected {
            out.push_str(&Theme::fg(&theme.colors.selection_fg));
            out.push_str(&Theme::bg(&theme.colors.selection_bg));
        }

        current_pos = end;
    }

    if current_pos < chars.len() {
        out.extend(&chars[current_pos..]);
    }
}

/// Character ranges of case-insensitive occurrences of `needle` in `text`.
#[must_use]
pub fn find_ranges(text: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    let hay: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    let pat: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    // Lowercasing can change the length of some characters; fall back to no
    // highlight rather than misplace it.
    if hay.len() != text.chars().count() || pat.is_empty() {
        return Vec::new();
    }
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + pat.len() <= hay.len() {
        if hay[i..i + pat.len()] == pat[..] {
            ranges.push((i, i + pat.len()));
            i += pat.len();
        } else {
            i += 1;
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_pads_and_truncates_by_chars() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("ééé", 3), "ééé");
        assert_eq!(fit_right("7", 3), "  7");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn highlighted_text_keeps_all_characters() {
        let mut out = String::new();
        render_highlighted_text(&mut out, "api/users", &[(4, 6), (20, 30)], &Theme::default(), false);
        let plain: String = out
            .split('\u{1b}')
            .map(|part| part.split_once('m').map_or(part, |(_, rest)| rest))
            .collect();
        assert_eq!(plain, "api/users");
    }

    #[test]
    fn find_ranges_is_case_insensitive() {
        assert_eq!(find_ranges("Content-Type: JSON json", "json"), vec![(14, 18), (19, 23)]);
        assert!(find_ranges("abc", "").is_empty());
    }
}
