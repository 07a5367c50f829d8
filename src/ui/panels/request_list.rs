//! The request list panel.

use super::Edge;
use crate::domain::request::{format_duration, format_size};
use crate::domain::Request;
use crate::store::{highlight_ranges, StatePatch, Store};
use crate::ui::virtual_list::{ReconcileStats, SlotPool, VirtualList};
use std::sync::Arc;

/// Pre-formatted content of one list row, held in a recycled slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRow {
    pub method: String,
    pub status: String,
    pub name: String,
    pub kind: String,
    pub size: String,
    pub time: String,
    pub failed: bool,
    pub pending: bool,
    pub status_code: u16,
    /// Fuzzy match ranges within `name` (character indices).
    pub highlight: Vec<(usize, usize)>,
}

impl ListRow {
    #[must_use]
    pub fn from_request(request: &Request, query: &str) -> Self {
        let status = if request.failed {
            "ERR".to_string()
        } else if request.status == 0 {
            "...".to_string()
        } else {
            request.status.to_string()
        };
        let highlight = if query.trim().is_empty() {
            Vec::new()
        } else {
            highlight_ranges(&request.name, query)
        };
        Self {
            method: request.method.clone(),
            status,
            name: request.name.clone(),
            kind: request.resource_type.label().to_string(),
            size: if request.transferred_size == 0 {
                "-".to_string()
            } else {
                format_size(request.transferred_size)
            },
            time: if request.duration > 0.0 {
                format_duration(request.duration)
            } else {
                "-".to_string()
            },
            failed: request.failed,
            pending: request.is_pending(),
            status_code: request.status,
            highlight,
        }
    }
}

type RowKey = (String, u64);

/// Selection, scrolling and slot-recycled rendering of the filtered view.
#[derive(Debug)]
pub struct RequestList {
    list: VirtualList,
    slots: SlotPool<RowKey, ListRow>,
    query: String,
}

impl RequestList {
    #[must_use]
    pub fn new(buffer_rows: usize) -> Self {
        Self {
            list: VirtualList::new(1, buffer_rows),
            slots: SlotPool::default(),
            query: String::new(),
        }
    }

    #[must_use]
    pub const fn virtual_list(&self) -> &VirtualList {
        &self.list
    }

    pub fn virtual_list_mut(&mut self) -> &mut VirtualList {
        &mut self.list
    }

    fn select(&mut self, store: &mut Store, index: usize) {
        self.list.scroll_into_view(index);
        store.set_state(StatePatch {
            selected_index: Some(index),
            ..StatePatch::default()
        });
    }

    /// Moves the selection by `delta` rows, clamped to the view.
    pub fn move_selection(&mut self, store: &mut Store, delta: isize) {
        let len = store.filtered_view().len();
        if len == 0 {
            return;
        }
        let current = store.settled().selected_index;
        let next = current.saturating_add_signed(delta).min(len - 1);
        tracing::trace!(current, next, "move selection");
        self.select(store, next);
    }

    pub fn navigate_to(&mut self, store: &mut Store, edge: Edge) {
        let len = store.filtered_view().len();
        if len == 0 {
            return;
        }
        let index = match edge {
            Edge::First => 0,
            Edge::Last => len - 1,
        };
        self.select(store, index);
    }

    /// Moves half a viewport down (`direction > 0`) or up.
    pub fn page(&mut self, store: &mut Store, direction: isize) {
        let half = (self.list.rows_per_viewport() / 2).max(1);
        let step = isize::try_from(half).unwrap_or(isize::MAX);
        self.move_selection(store, step.saturating_mul(direction.signum()));
    }

    /// Refreshes slot contents for the current window of `view`.
    ///
    /// Only rows whose request changed (new id or version) or that scrolled
    /// into the window are rebuilt.
    pub fn reconcile(&mut self, view: &[Arc<Request>], selected: usize, query: &str) -> ReconcileStats {
        if query != self.query {
            self.query = query.to_string();
            self.slots.invalidate();
        }
        self.list.clamp_to(view.len());
        if !view.is_empty() {
            self.list.scroll_into_view(selected.min(view.len() - 1));
        }

        let range = self.list.visible_range(view.len());
        let query = self.query.clone();
        let stats = self.slots.reconcile(
            range,
            |row| (view[row].id.clone(), view[row].version),
            |row| ListRow::from_request(&view[row], &query),
        );
        tracing::trace!(?stats, "list reconciled");
        stats
    }

    /// Rows to draw, in order: only those inside the viewport.
    #[must_use]
    pub fn viewport_rows(&self) -> Vec<(usize, &ListRow)> {
        let first = self.list.first_visible_row();
        let last = first + self.list.rows_per_viewport();
        self.slots
            .active()
            .into_iter()
            .filter(|(row, _)| (first..last).contains(row))
            .collect()
    }
}
