//! Theme management and ANSI escape sequence generation.
//!
//! Themes are either built in (Catppuccin variants, embedded at compile time)
//! or loaded from a TOML file. Colors are hex strings converted to 24-bit
//! ANSI sequences on use.
//!
//! # Built-in Themes
//!
//! - `catppuccin-mocha`: Dark theme (default)
//! - `catppuccin-latte`: Light theme
//!
//! # Theme Files
//!
//! A theme file is a `name` plus a `[colors]` table holding every field of
//! [`ThemeColors`] as `"#rrggbb"`; `header_bg` and `selection_bg` may be
//! omitted. The files under `themes/` are complete examples.

use crate::domain::{NetmodalError, Result};
use crate::store::StatusClass;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the theme used when none is configured or loading fails.
pub const DEFAULT_THEME: &str = "catppuccin-mocha";

/// Color scheme configuration for UI rendering.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Theme {
    /// Human-readable theme name.
    pub name: String,
    /// Color palette for all UI elements.
    pub colors: ThemeColors,
}

/// Color definitions for all UI elements, as hex strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeColors {
    pub header_fg: String,
    #[serde(default)]
    pub header_bg: Option<String>,

    /// Selected row foreground color.
    pub selection_fg: String,
    /// Selected row background color.
    pub selection_bg: String,

    pub text_normal: String,
    /// Footer, placeholders and secondary columns.
    pub text_dim: String,

    /// Border and separator line color.
    pub border: String,

    pub search_bar_border: String,
    /// Fuzzy match highlight foreground.
    pub match_highlight_fg: String,
    /// Fuzzy match highlight background.
    pub match_highlight_bg: String,

    pub empty_state_fg: String,

    /// Mode badge, active tab and active filter chips.
    pub accent: String,
    /// HTTP method column.
    pub method_fg: String,

    /// 2xx statuses and success messages.
    pub success: String,
    /// 3xx statuses and info messages.
    pub info: String,
    /// 4xx statuses.
    pub warning: String,
    /// 5xx statuses, failed requests and error messages.
    pub error: String,
}

impl Theme {
    /// Built-in theme by name; `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let source = match name {
            "catppuccin-mocha" => include_str!("../../themes/catppuccin-mocha.toml"),
            "catppuccin-latte" => include_str!("../../themes/catppuccin-latte.toml"),
            _ => return None,
        };
        toml::from_str(source).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`NetmodalError::Theme`] if the file cannot be read or its
    /// content is not a valid theme.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| NetmodalError::Theme(format!("Failed to read theme file: {e}")))?;

        toml::from_str(&contents).map_err(|e| NetmodalError::Theme(format!("Failed to parse theme TOML: {e}")))
    }

    /// Resolves the configured theme: a file first, then a built-in name,
    /// then the default. Failures are logged and fall through.
    #[must_use]
    pub fn resolve(file: Option<&Path>, name: Option<&str>) -> Self {
        if let Some(path) = file {
            match Self::from_file(path) {
                Ok(theme) => return theme,
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "theme file rejected"),
            }
        }
        if let Some(name) = name {
            if let Some(theme) = Self::from_name(name) {
                return theme;
            }
            tracing::debug!(name, "unknown theme name");
        }
        Self::default()
    }

    /// Color for an HTTP status code; status 0 means still pending.
    #[must_use]
    pub fn status_color(&self, status: u16, failed: bool) -> &str {
        match (failed, status) {
            (true, _) | (false, 500..) => &self.colors.error,
            (false, 400..=499) => &self.colors.warning,
            (false, 300..=399) => &self.colors.info,
            (false, 200..=299) => &self.colors.success,
            (false, _) => &self.colors.text_dim,
        }
    }

    /// Color of a status line message.
    #[must_use]
    pub fn message_color(&self, class: StatusClass) -> &str {
        match class {
            StatusClass::Error => &self.colors.error,
            StatusClass::Info => &self.colors.info,
            StatusClass::Success => &self.colors.success,
        }
    }

    /// Parses `#rrggbb` (the `#` is optional).
    fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some((channel(0)?, channel(2)?, channel(4)?))
    }

    /// 24-bit color escape; `layer` is 38 for foreground, 48 for background.
    /// Unparsable colors render as white.
    fn rgb_escape(layer: u8, hex: &str) -> String {
        let (r, g, b) = Self::parse_hex(hex).unwrap_or((255, 255, 255));
        format!("\u{1b}[{layer};2;{r};{g};{b}m")
    }

    /// Foreground color escape for a hex color.
    ///
    /// # Example
    ///
    /// ```rust
    /// use netmodal::ui::Theme;
    ///
    /// assert_eq!(Theme::fg("#ff0000"), "\u{1b}[38;2;255;0;0m");
    /// ```
    #[must_use]
    pub fn fg(hex: &str) -> String {
        Self::rgb_escape(38, hex)
    }

    #[must_use]
    pub fn bg(hex: &str) -> String {
        Self::rgb_escape(48, hex)
    }

    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{1b}[1m"
    }

    #[must_use]
    pub const fn dim() -> &'static str {
        "\u{1b}[2m"
    }

    /// Clears every color and attribute.
    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{1b}[0m"
    }
}

impl Default for Theme {
    /// Catppuccin Mocha.
    ///
    /// # Panics
    ///
    /// Panics if the embedded theme fails to parse, which the tests rule out.
    fn default() -> Self {
        Self::from_name(DEFAULT_THEME).expect("Built-in catppuccin-mocha theme should always parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_themes_parse() {
        assert_eq!(Theme::default().name, DEFAULT_THEME);
        assert!(Theme::from_name("catppuccin-latte").is_some());
        assert!(Theme::from_name("nope").is_none());
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = 'broken'").unwrap();
        let theme = Theme::resolve(Some(file.path()), Some("unknown"));
        assert_eq!(theme.name, DEFAULT_THEME);

        let theme = Theme::resolve(None, Some("catppuccin-latte"));
        assert_eq!(theme.name, "catppuccin-latte");
    }

    #[test]
    fn status_colors_by_class() {
        let theme = Theme::default();
        assert_eq!(theme.status_color(204, false), theme.colors.success);
        assert_eq!(theme.status_color(404, false), theme.colors.warning);
        assert_eq!(theme.status_color(200, true), theme.colors.error);
        assert_eq!(theme.status_color(0, false), theme.colors.text_dim);
    }

    #[test]
    fn invalid_hex_is_white() {
        assert_eq!(Theme::fg("#zz"), "\u{1b}[38;2;255;255;255m");
    }
}
