//! One-shot timers on a single logical timeline.
//!
//! Time is measured from an arbitrary origin as a `Duration`. The owner feeds
//! the current time in (`pop_due`, `advance`), so the same queue runs against the wall
//! clock in the engine thread and against a virtual clock in tests.

use std::collections::BTreeSet;
use std::time::Duration;

/// Identifies one scheduled callback. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeSet<(Duration, TimerHandle)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time. While a timer is being fired this is its deadline.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arms a callback `after` from now.
    pub fn schedule(&mut self, after: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert((self.now + after, handle));
        handle
    }

    /// Drops a pending callback. Unknown or already-fired handles are ignored.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|(_, h)| *h != handle);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.first().map(|(at, _)| *at)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes the earliest callback due at `now` and moves the clock to its
    /// deadline, so anything it schedules is measured from when it was due.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerHandle> {
        let &(at, handle) = self.pending.first()?;
        if at > now {
            return None;
        }
        self.pending.remove(&(at, handle));
        self.now = self.now.max(at);
        Some(handle)
    }

    /// Moves the clock forward; it never runs backwards.
    pub fn advance(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
