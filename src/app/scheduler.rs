//! Cooperative tick scheduler with a host-supplied clock.
//!
//! Everything time-dependent in the core (multi-key sequence expiry, status
//! auto-clear, attach retries, reattachment) is a [`Timer`] registered here.
//! The host advances the clock once per loop iteration; due timers come back
//! in deadline order and are dispatched by [`crate::app::App::tick`] before
//! the store commits its batched updates. Tests drive the same path with
//! literal millisecond values, so ordering is deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Milliseconds on the scheduler's clock.
pub type Millis = u64;

/// Work that becomes due at a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Timer {
    /// A pending key sequence expires; stale generations are ignored.
    SequenceTimeout { generation: u64 },
    /// An info/success status message auto-clears.
    StatusClear { id: u64 },
    /// Retry attaching to the capture source after a transient failure.
    AttachRetry,
    /// Reattach after the capture source detached.
    Reattach,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Millis,
    seq: u64,
    queue: BinaryHeap<Reverse<(Millis, u64, Timer)>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Registers `timer` to fire `delay` milliseconds from now.
    pub fn schedule(&mut self, delay: Millis, timer: Timer) -> Millis {
        let deadline = self.now.saturating_add(delay);
        self.seq = self.seq.wrapping_add(1);
        self.queue.push(Reverse((deadline, self.seq, timer)));
        tracing::trace!(?timer, deadline, "timer scheduled");
        deadline
    }

    /// Moves the clock forward and drains every timer due at or before `now`.
    ///
    /// The clock never moves backwards; an earlier `now` is ignored.
    pub fn advance(&mut self, now: Millis) -> Vec<Timer> {
        self.now = self.now.max(now);
        let mut due = Vec::new();
        while let Some(Reverse((deadline, _, timer))) = self.queue.peek().copied() {
            if deadline > self.now {
                break;
            }
            self.queue.pop();
            due.push(timer);
        }
        due
    }

    /// Earliest pending deadline, used by the host to size its poll timeout.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue.peek().map(|Reverse((deadline, _, _))| *deadline)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule(300, Timer::StatusClear { id: 1 });
        scheduler.schedule(100, Timer::AttachRetry);
        scheduler.schedule(100, Timer::Reattach);

        assert!(scheduler.advance(99).is_empty());
        assert_eq!(scheduler.advance(100), [Timer::AttachRetry, Timer::Reattach]);
        assert_eq!(scheduler.advance(1_000), [Timer::StatusClear { id: 1 }]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut scheduler = Scheduler::new(500);
        scheduler.advance(100);
        assert_eq!(scheduler.now(), 500);
        assert_eq!(scheduler.schedule(10, Timer::Reattach), 510);
        assert_eq!(scheduler.next_deadline(), Some(510));
    }
}
