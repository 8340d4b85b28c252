#![forbid(unsafe_code)]

//! One-shot timers over host-supplied time.
//!
//! [`TimerQueue`] holds tasks ordered by deadline, then by scheduling order, so
//! two timers due at the same instant fire in the order they were scheduled.
//! The queue never fires on its own; the owner drains it with
//! [`TimerQueue::pop_due`] whenever the host reports that time has advanced.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle returned by [`TimerQueue::schedule`], usable with [`TimerQueue::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    deadline: Duration,
    seq: u64,
}

/// Deadline-ordered one-shot timers.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    entries: BTreeMap<(Duration, u64), T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Duration, task: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.insert((deadline, seq), task);
        TimerId { deadline, seq }
    }

    /// Schedule `task` to fire `delay` after `now`.
    pub fn schedule_after(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        self.schedule(now.saturating_add(delay), task)
    }

    /// Cancel a timer. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.entries.remove(&(id.deadline, id.seq))
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<T> {
        let (&key, _) = self.entries.first_key_value()?;
        if key.0 > now {
            return None;
        }
        self.entries.remove(&key)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Earliest of two optional deadlines.
#[must_use]
pub fn earliest(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_deadline_then_insertion_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(30), "c");
        q.schedule(ms(10), "a");
        q.schedule(ms(10), "b");
        assert_eq!(q.next_deadline(), Some(ms(10)));
        assert_eq!(q.pop_due(ms(5)), None);
        assert_eq!(q.pop_due(ms(10)), Some("a"));
        assert_eq!(q.pop_due(ms(10)), Some("b"));
        assert_eq!(q.pop_due(ms(29)), None);
        assert_eq!(q.pop_due(ms(100)), Some("c"));
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_removes_only_that_timer() {
        let mut q = TimerQueue::new();
        let a = q.schedule_after(ms(0), ms(10), 1);
        q.schedule_after(ms(0), ms(10), 2);
        assert_eq!(q.cancel(a), Some(1));
        assert_eq!(q.cancel(a), None);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(ms(10)), Some(2));
    }

    #[test]
    fn earliest_prefers_present_values() {
        assert_eq!(earliest(None, None), None);
        assert_eq!(earliest(Some(ms(3)), None), Some(ms(3)));
        assert_eq!(earliest(Some(ms(3)), Some(ms(2))), Some(ms(2)));
    }
}
