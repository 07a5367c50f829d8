//! Top-level rendering coordinator.
//!
//! [`Layout::compute`] splits the terminal into regions for a given state;
//! [`render`] draws a [`UIViewModel`] into those regions and returns the
//! whole frame as one string of ANSI output. Every cell of the frame is
//! written, so the host never needs to clear the screen between frames.

use crate::app::modes::Mode;
use crate::store::AppState;
use crate::ui::components::{self, Rect};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::UIViewModel;

/// Rows taken by the bottom border, status line and footer.
const BOTTOM_ROWS: usize = 3;

/// Screen regions of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
    pub rows: usize,
    pub cols: usize,
    pub search_row: Option<usize>,
    pub chips_row: Option<usize>,
    /// Request list region including its column header row; zero width when
    /// hidden.
    pub list: Rect,
    /// Detail region including its tab row.
    pub detail: Rect,
}

impl Layout {
    /// Computes the regions for `state` in a `rows` x `cols` terminal.
    #[must_use]
    pub fn compute(state: &AppState, rows: usize, cols: usize) -> Self {
        let mut top = 3; // header + border, 1-indexed
        let search_row = (state.mode == Mode::Search || !state.search_query.is_empty()).then(|| {
            let row = top;
            top += 3;
            row
        });
        let chips_row = (state.mode == Mode::Filter || !state.filter.selected.is_empty()).then(|| {
            let row = top;
            top += 1;
            row
        });

        let height = rows.saturating_sub(top - 1 + BOTTOM_ROWS);
        let full_width = state.mode == Mode::Inspect && state.inspect.full_width;
        let list_width = if full_width {
            0
        } else if cols >= 100 {
            cols * 11 / 20
        } else {
            cols / 2
        };
        let detail_col = if list_width == 0 { 1 } else { list_width + 2 };

        Self {
            rows,
            cols,
            search_row,
            chips_row,
            list: Rect {
                row: top,
                col: 1,
                width: list_width,
                height: if list_width == 0 { 0 } else { height },
            },
            detail: Rect {
                row: top,
                col: detail_col,
                width: cols.saturating_sub(detail_col - 1),
                height,
            },
        }
    }

    /// Request rows visible below the column headers.
    #[must_use]
    pub const fn list_rows(&self) -> usize {
        self.list.height.saturating_sub(1)
    }

    /// Detail lines visible below the tab bar.
    #[must_use]
    pub const fn detail_rows(&self) -> usize {
        self.detail.height.saturating_sub(1)
    }
}

/// One rendered frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// ANSI output that repaints every cell of the terminal.
    pub output: String,
    /// Measured height of one request list row, when any row was painted.
    pub list_row_height: Option<usize>,
}

/// Renders a full frame.
///
/// # Parameters
///
/// * `vm` - View model computed for this frame
/// * `layout` - Regions computed from the same state
/// * `theme` - Active color theme
#[must_use]
pub fn render(vm: &UIViewModel, layout: &Layout, theme: &Theme) -> Frame {
    let _span = tracing::trace_span!("render", rows = layout.rows, cols = layout.cols).entered();
    let mut out = String::with_capacity(layout.rows * layout.cols * 4);
    let mut list_row_height = None;
    let cols = layout.cols;
    if layout.rows < BOTTOM_ROWS + 3 || cols == 0 {
        return Frame::default();
    }

    let row = components::render_header(&mut out, 1, &vm.header, theme, cols);
    components::render_border(&mut out, row, &theme.colors.border, cols);

    if let (Some(search_row), Some(search)) = (layout.search_row, &vm.search_bar) {
        components::render_search_bar(&mut out, search_row, search, theme, cols);
    }
    if let (Some(chips_row), Some(chips)) = (layout.chips_row, &vm.chips) {
        components::render_chips(&mut out, chips_row, chips, theme, cols);
    }

    if let Some(list) = &vm.list {
        if layout.list.width > 0 {
            list_row_height = components::render_list(&mut out, layout.list, list, theme);
            components::render_separator(
                &mut out,
                layout.list.row,
                layout.list.width + 1,
                layout.list.height,
                &theme.colors.border,
            );
        }
    }
    components::render_detail(&mut out, layout.detail, &vm.detail, theme);

    if let Some(menu) = &vm.copy_menu {
        let body = Rect {
            row: layout.detail.row,
            col: 1,
            width: cols,
            height: layout.detail.height,
        };
        components::render_copy_menu(&mut out, body, menu, theme);
    }

    let bottom = layout.rows - BOTTOM_ROWS + 1;
    components::render_border(&mut out, bottom, &theme.colors.border, cols);
    components::render_status(&mut out, bottom + 1, vm.status.as_ref(), theme, cols);
    components::render_footer(&mut out, bottom + 2, &vm.footer, theme, cols);
    Frame {
        output: out,
        list_row_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StatePatch;
    use crate::store::Store;

    #[test]
    fn layout_splits_body_and_hides_list_full_width() {
        let mut store = Store::default();
        let layout = Layout::compute(&store.get_state(), 30, 120);
        assert_eq!(layout.list.row, 3);
        assert_eq!(layout.list.height, 30 - 2 - 3);
        assert_eq!(layout.list.width, 66);
        assert_eq!(layout.detail.col, 68);
        assert_eq!(layout.detail.col - 1 + layout.detail.width, 120);

        let mut inspect = store.get_state().inspect.clone();
        inspect.full_width = true;
        store.set_state(StatePatch {
            mode: Some(Mode::Inspect),
            inspect: Some(inspect),
            ..StatePatch::default()
        });
        store.flush();
        let layout = Layout::compute(&store.get_state(), 30, 120);
        assert_eq!(layout.list.width, 0);
        assert_eq!(layout.detail.width, 120);
    }

    #[test]
    fn search_box_pushes_body_down() {
        let mut store = Store::default();
        store.set_state(StatePatch {
            mode: Some(Mode::Search),
            ..StatePatch::default()
        });
        store.flush();
        let layout = Layout::compute(&store.get_state(), 30, 80);
        assert_eq!(layout.search_row, Some(3));
        assert_eq!(layout.list.row, 6);
        assert_eq!(layout.detail_rows(), 30 - 5 - 3 - 1);
    }
}
