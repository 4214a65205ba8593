//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Deadline-ordered timer queue for single-task event loops.
//!
//! Unlike [`crate::task::Task`] based timers, the timers in a [`TimerQueue`]
//! don't spawn anything. The owner of the queue is expected to sleep until
//! [`TimerQueue::next_deadline`] and then drain the expired events using
//! [`TimerQueue::pop_expired`], which keeps all timer handling serialized
//! with the rest of the owner's message processing.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

/// Identifier of a scheduled timer.
///
/// Identifiers are never reused within the same queue, so an event handler
/// can compare the identifier of a fired timer against the one it stored to
/// detect superseded timers.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimerId(u64);

/// Handle to a timer scheduled in a [`TimerQueue`].
///
/// Dropping the handle doesn't cancel the timer. Use [`TimerQueue::cancel`]
/// for that.
#[derive(Debug, Eq, PartialEq)]
pub struct Holdtimer {
    id: TimerId,
    deadline: Instant,
}

/// A min-heap of timers keyed by their deadlines.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<(Instant, TimerId)>>,
    armed: HashMap<TimerId, T>,
    next_id: u64,
}

// ===== impl Holdtimer =====

impl Holdtimer {
    /// Returns the timer identifier.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Returns the instant the timer is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the time remaining until the timer is due.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

// ===== impl TimerQueue =====

impl<T> TimerQueue<T> {
    /// Creates an empty timer queue.
    pub fn new() -> Self {
        TimerQueue {
            heap: Default::default(),
            armed: Default::default(),
            next_id: 0,
        }
    }

    /// Schedules `event` to fire after `timeout`.
    pub fn schedule(&mut self, timeout: Duration, event: T) -> Holdtimer {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let deadline = Instant::now() + timeout;
        self.heap.push(Reverse((deadline, id)));
        self.armed.insert(id, event);
        Holdtimer { id, deadline }
    }

    /// Cancels a scheduled timer.
    ///
    /// Returns `false` if the timer had already fired or been canceled.
    pub fn cancel(&mut self, timer: &Holdtimer) -> bool {
        // Heap entries of canceled timers are skipped lazily.
        self.armed.remove(&timer.id).is_some()
    }

    /// Returns whether the given timer is still pending.
    pub fn is_armed(&self, timer: &Holdtimer) -> bool {
        self.armed.contains_key(&timer.id)
    }

    /// Returns the deadline of the earliest pending timer.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_canceled();
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Removes and returns the earliest timer that is due at `now`.
    ///
    /// Timers with the same deadline fire in the order they were scheduled.
    pub fn pop_expired(&mut self, now: Instant) -> Option<(TimerId, T)> {
        self.discard_canceled();
        let Reverse((deadline, id)) = *self.heap.peek()?;
        if deadline > now {
            return None;
        }
        self.heap.pop();
        self.armed.remove(&id).map(|event| (id, event))
    }

    /// Returns the number of pending timers.
    pub fn len(&self) -> usize {
        self.armed.len()
    }

    /// Returns whether there are no pending timers.
    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Cancels all pending timers, returning how many were canceled.
    pub fn clear(&mut self) -> usize {
        let count = self.armed.len();
        self.heap.clear();
        self.armed.clear();
        count
    }

    fn discard_canceled(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.armed.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ===== unit tests =====
