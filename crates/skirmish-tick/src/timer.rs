//! Deterministic timer queue driven by the simulation tick.
//!
//! Delayed work (respawn grace, session teardown, countdown side effects)
//! is stored as `(fire-at tick, payload)` instead of scheduled closures.
//! The owner calls [`TimerQueue::advance`] once per tick and handles the
//! payloads that came due, in scheduling order. Timers are cancelled by
//! payload, so the owner never has to hold on to handles.

use std::collections::BTreeMap;

/// Timers keyed by the tick they fire on.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: u64,
    /// Scheduling sequence, breaks ties between timers due on one tick.
    next_seq: u64,
    entries: BTreeMap<(u64, u64), T>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Schedules `payload` to fire `delay` ticks from now.
    ///
    /// A delay of 0 fires on the next `advance`.
    pub fn schedule_in(&mut self, delay: u64, payload: T) {
        let fire_at = self.now.saturating_add(delay.max(1));
        self.entries.insert((fire_at, self.next_seq), payload);
        self.next_seq += 1;
    }

    /// Cancels every pending timer whose payload matches `pred`.
    /// Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, payload| !pred(payload));
        before - self.entries.len()
    }

    /// Moves the clock one tick forward and returns the payloads that are
    /// now due, oldest first.
    pub fn advance(&mut self) -> Vec<T> {
        self.now += 1;
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > self.now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
