//! Windowed list with presentation slot recycling.
//!
//! [`VirtualList`] decides which rows of a (possibly long) list are worth
//! materializing for the current scroll position, and [`SlotPool`] keeps the
//! materialized rows in reusable slots. When the window shifts, slots that
//! fell out of it are repositioned onto newly visible rows and their content
//! swapped, instead of being dropped and rebuilt. Content is only rebuilt
//! when a slot's row or the row's key (id plus version) changed.
//!
//! Offsets are in abstract height units. The terminal host uses one unit per
//! text line, but nothing here assumes that.

use std::collections::HashSet;
use std::ops::Range;

/// Scroll offset that brings `[top, top + height)` into a viewport.
///
/// Moves in one direction only: up so the row touches the top edge, or down
/// so it touches the bottom edge. Returns `offset` unchanged when the row is
/// already fully visible.
#[must_use]
pub const fn scroll_into_view(offset: usize, viewport: usize, top: usize, height: usize) -> usize {
    let bottom = top + height;
    if top < offset {
        top
    } else if bottom > offset + viewport {
        bottom.saturating_sub(viewport)
    } else {
        offset
    }
}

/// Counts of what a [`SlotPool::reconcile`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Slots left untouched (same row, same key).
    pub reused: usize,
    /// Slots whose content was rebuilt, in place or after repositioning.
    pub refilled: usize,
    /// Slots allocated because the pool was too small.
    pub created: usize,
}

#[derive(Debug, Clone)]
pub struct Slot<K, T> {
    /// Row currently shown by this slot; `None` while parked.
    pub row: Option<usize>,
    key: Option<K>,
    pub content: T,
}

/// Arena of reusable row handles.
#[derive(Debug, Clone)]
pub struct SlotPool<K, T> {
    slots: Vec<Slot<K, T>>,
}

impl<K, T> Default for SlotPool<K, T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<K: PartialEq, T> SlotPool<K, T> {
    /// Makes the pool cover exactly `range`.
    ///
    /// `key_fn` identifies the content a row should show; `fill_fn` builds
    /// that content and runs only for slots that need it.
    pub fn reconcile(
        &mut self,
        range: Range<usize>,
        key_fn: impl Fn(usize) -> K,
        mut fill_fn: impl FnMut(usize) -> T,
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let mut covered = HashSet::new();
        let mut free = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            match slot.row {
                Some(row) if range.contains(&row) => {
                    let key = key_fn(row);
                    if slot.key.as_ref() == Some(&key) {
                        stats.reused += 1;
                    } else {
                        slot.content = fill_fn(row);
                        slot.key = Some(key);
                        stats.refilled += 1;
                    }
                    covered.insert(row);
                }
                _ => free.push(index),
            }
        }

        for row in range.filter(|row| !covered.contains(row)) {
            let key = key_fn(row);
            if let Some(index) = free.pop() {
                let slot = &mut self.slots[index];
                slot.row = Some(row);
                slot.content = fill_fn(row);
                slot.key = Some(key);
                stats.refilled += 1;
            } else {
                self.slots.push(Slot {
                    row: Some(row),
                    key: Some(key),
                    content: fill_fn(row),
                });
                stats.created += 1;
            }
        }

        for index in free {
            self.slots[index].row = None;
        }
        stats
    }

    /// Forces every slot to refill on the next reconcile.
    pub fn invalidate(&mut self) {
        for slot in &mut self.slots {
            slot.key = None;
        }
    }

    /// Number of allocated slots, parked ones included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Content of the slot showing `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.slots
            .iter()
            .find(|slot| slot.row == Some(row))
            .map(|slot| &slot.content)
    }

    /// Active slots ordered by row.
    #[must_use]
    pub fn active(&self) -> Vec<(usize, &T)> {
        let mut rows: Vec<(usize, &T)> = self
            .slots
            .iter()
            .filter_map(|slot| slot.row.map(|row| (row, &slot.content)))
            .collect();
        rows.sort_by_key(|(row, _)| *row);
        rows
    }
}

/// Scroll and window arithmetic for a uniform-height list.
#[derive(Debug, Clone)]
pub struct VirtualList {
    row_height: usize,
    measured: bool,
    viewport_height: usize,
    scroll_offset: usize,
    buffer_rows: usize,
}

impl VirtualList {
    /// `estimated_row_height` is used until [`record_measurement`](Self::record_measurement).
    #[must_use]
    pub fn new(estimated_row_height: usize, buffer_rows: usize) -> Self {
        Self {
            row_height: estimated_row_height.max(1),
            measured: false,
            viewport_height: 0,
            scroll_offset: 0,
            buffer_rows,
        }
    }

    #[must_use]
    pub const fn row_height(&self) -> usize {
        self.row_height
    }

    /// True once the estimate was replaced by a measurement.
    #[must_use]
    pub const fn is_measured(&self) -> bool {
        self.measured
    }

    #[must_use]
    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    #[must_use]
    pub const fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
    }

    /// Replaces the estimate with an actual measurement taken after the
    /// first paint. Later measurements are ignored.
    ///
    /// The scroll offset is rescaled so the same first row stays on top.
    pub fn record_measurement(&mut self, height: usize) -> bool {
        if self.measured || height == 0 {
            return false;
        }
        let first_row = self.scroll_offset / self.row_height;
        tracing::debug!(estimate = self.row_height, measured = height, "row height corrected");
        self.row_height = height;
        self.scroll_offset = first_row * height;
        self.measured = true;
        true
    }

    /// Rows fully or partly inside the viewport.
    #[must_use]
    pub fn rows_per_viewport(&self) -> usize {
        self.viewport_height.div_ceil(self.row_height)
    }

    /// Rows to materialize for a list of `total` rows.
    ///
    /// One row above the viewport and `buffer_rows` below it are included.
    #[must_use]
    pub fn visible_range(&self, total: usize) -> Range<usize> {
        let start = (self.scroll_offset / self.row_height).saturating_sub(1);
        let end = total.min(start + self.rows_per_viewport() + self.buffer_rows);
        start.min(end)..end
    }

    /// First row whose top is inside the viewport.
    #[must_use]
    pub const fn first_visible_row(&self) -> usize {
        self.scroll_offset / self.row_height
    }

    /// Scrolls just enough to show `index`; returns true if the offset moved.
    pub fn scroll_into_view(&mut self, index: usize) -> bool {
        let next = scroll_into_view(
            self.scroll_offset,
            self.viewport_height,
            index * self.row_height,
            self.row_height,
        );
        let moved = next != self.scroll_offset;
        self.scroll_offset = next;
        moved
    }

    /// Keeps the offset valid after the list shrank.
    pub fn clamp_to(&mut self, total: usize) {
        let max = (total * self.row_height).saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(viewport: usize) -> VirtualList {
        let mut list = VirtualList::new(1, 5);
        list.set_viewport_height(viewport);
        list
    }

    #[test]
    fn visible_range_follows_formula() {
        let mut list = list(10);
        assert_eq!(list.visible_range(1_000), 0..15);
        list.scroll_offset = 100;
        assert_eq!(list.visible_range(1_000), 99..114);
        assert_eq!(list.visible_range(105), 99..105);
        assert_eq!(list.visible_range(0), 0..0);
    }

    #[test]
    fn measurement_replaces_estimate_once() {
        let mut list = VirtualList::new(2, 0);
        list.set_viewport_height(10);
        list.scroll_into_view(20);
        assert_eq!(list.scroll_offset(), 32);
        assert!(list.record_measurement(1));
        assert_eq!(list.row_height(), 1);
        assert_eq!(list.scroll_offset(), 16);
        assert!(!list.record_measurement(3));
        assert_eq!(list.visible_range(100), 15..25);
    }

    #[test]
    fn scroll_into_view_is_one_directional() {
        let mut list = list(10);
        assert!(!list.scroll_into_view(9));
        assert!(list.scroll_into_view(10));
        assert_eq!(list.scroll_offset(), 1);
        assert!(list.scroll_into_view(0));
        assert_eq!(list.scroll_offset(), 0);
        assert!(!list.scroll_into_view(5));
    }

    #[test]
    fn slots_are_recycled_when_window_shifts() {
        let mut pool: SlotPool<usize, String> = SlotPool::default();
        let stats = pool.reconcile(0..10, |row| row, |row| format!("row {row}"));
        assert_eq!(stats, ReconcileStats { reused: 0, refilled: 0, created: 10 });

        let stats = pool.reconcile(3..13, |row| row, |row| format!("row {row}"));
        assert_eq!(stats, ReconcileStats { reused: 7, refilled: 3, created: 0 });
        assert_eq!(pool.capacity(), 10);
        assert_eq!(pool.get(12).map(String::as_str), Some("row 12"));
        assert!(pool.get(0).is_none());

        let rows: Vec<usize> = pool.active().into_iter().map(|(row, _)| row).collect();
        assert_eq!(rows, (3..13).collect::<Vec<_>>());
    }

    #[test]
    fn changed_key_refills_in_place() {
        let mut pool: SlotPool<(usize, u64), u64> = SlotPool::default();
        pool.reconcile(0..3, |row| (row, 0), |_| 0);
        let stats = pool.reconcile(0..3, |row| (row, u64::from(row == 1)), |_| 1);
        assert_eq!(stats, ReconcileStats { reused: 2, refilled: 1, created: 0 });
        assert_eq!(pool.get(1), Some(&1));
    }

    #[test]
    fn shrinking_window_parks_slots() {
        let mut pool: SlotPool<usize, usize> = SlotPool::default();
        pool.reconcile(0..5, |row| row, |row| row);
        pool.reconcile(0..2, |row| row, |row| row);
        assert_eq!(pool.active().len(), 2);
        let stats = pool.reconcile(0..5, |row| row, |row| row);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.refilled, 3);
    }
}
