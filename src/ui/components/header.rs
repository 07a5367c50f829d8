//! Header component renderer.
//!
//! One line: title, mode badge, request counts, capture state and the
//! pending sequence prefix.

use crate::store::CaptureStatus;
use crate::ui::helpers::{fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::HeaderInfo;

fn capture_label(capture: CaptureStatus) -> String {
    match capture {
        CaptureStatus::Inactive => "○ capture off".to_string(),
        CaptureStatus::Attaching { attempt } => format!("◌ attaching ({attempt})"),
        CaptureStatus::Active => "● capturing".to_string(),
        CaptureStatus::Failed => "✕ capture failed".to_string(),
    }
}

/// Renders the header bar at `row`.
///
/// # Returns
///
/// The next available row position (row + 1)
///
/// # Layout
///
/// ```text
///  netmodal  NORMAL   12/40 requests   g…                      ● capturing
/// ```
pub fn render_header(out: &mut String, row: usize, header: &HeaderInfo, theme: &Theme, cols: usize) -> usize {
    position_cursor(out, row, 1);
    if let Some(bg) = &theme.colors.header_bg {
        out.push_str(&Theme::bg(bg));
    }

    let title = format!(" {} ", header.title);
    let badge = format!(" {} ", header.mode.label());
    let counts = format!("  {}/{} requests", header.shown, header.total);
    let prefix = header.pending_prefix.map(|c| format!("  {c}…")).unwrap_or_default();
    let capture = format!("{} ", capture_label(header.capture));

    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.header_fg));
    out.push_str(&title);
    out.push_str(&Theme::fg(&theme.colors.selection_fg));
    out.push_str(&Theme::bg(&theme.colors.accent));
    out.push_str(&badge);
    out.push_str(Theme::reset());
    if let Some(bg) = &theme.colors.header_bg {
        out.push_str(&Theme::bg(bg));
    }
    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(&counts);
    out.push_str(&Theme::fg(&theme.colors.accent));
    out.push_str(&prefix);

    let used = [&title, &badge, &counts, &prefix]
        .iter()
        .map(|s| s.chars().count())
        .sum::<usize>();
    let remaining = cols.saturating_sub(used);
    let color = match header.capture {
        CaptureStatus::Active => &theme.colors.success,
        CaptureStatus::Failed => &theme.colors.error,
        CaptureStatus::Inactive | CaptureStatus::Attaching { .. } => &theme.colors.text_dim,
    };
    out.push_str(&Theme::fg(color));
    let capture_len = capture.chars().count().min(remaining);
    out.push_str(&" ".repeat(remaining - capture_len));
    out.push_str(&fit(&capture, capture_len));
    out.push_str(Theme::reset());
    row + 1
}
