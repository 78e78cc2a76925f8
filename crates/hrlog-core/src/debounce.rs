//! Debounced coalescing of per-field edits.
//!
//! Typing into a form produces a burst of edits for the same field. The
//! coalescer holds one pending edit per field and restarts that field's
//! timer on every new edit, so a burst commits once, `window` after its last
//! keystroke. The committed edit carries the first old value of the burst
//! and the last new value.

use crate::model::FieldValue;
use crate::scheduler::{TimerId, TimerQueue};
use std::collections::HashMap;

/// A burst of edits to one field, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct CoalescedEdit {
    pub field: String,
    /// Value before the first edit of the burst
    pub old_value: FieldValue,
    /// Value after the last edit of the burst
    pub new_value: FieldValue,
    /// Number of edits folded into this one
    pub edits: u32,
    /// Time of the most recent edit
    pub last_edit_millis: i64,
}

#[derive(Debug)]
struct PendingEdit {
    old_value: FieldValue,
    new_value: FieldValue,
    edits: u32,
    last_edit_millis: i64,
    timer: TimerId,
}

/// One pending edit per field, each with its own restartable timer
#[derive(Debug)]
pub struct DebounceCoalescer {
    window_millis: i64,
    pending: HashMap<String, PendingEdit>,
    timers: TimerQueue<String>,
}

impl DebounceCoalescer {
    pub fn new(window_millis: u64) -> Self {
        Self {
            window_millis: i64::try_from(window_millis).unwrap_or(i64::MAX),
            pending: HashMap::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn window_millis(&self) -> i64 {
        self.window_millis
    }

    /// Record an edit to `field` made at `now_millis`
    ///
    /// Replaces any pending timer for the field; the burst keeps its first
    /// old value and takes `new_value` as its latest value.
    pub fn schedule(
        &mut self,
        field: &str,
        old_value: FieldValue,
        new_value: FieldValue,
        now_millis: i64,
    ) -> TimerId {
        let due = now_millis.saturating_add(self.window_millis);
        let timer = self.timers.schedule_at(due, field.to_string());

        match self.pending.get_mut(field) {
            Some(pending) => {
                self.timers.cancel(pending.timer);
                pending.new_value = new_value;
                pending.edits += 1;
                pending.last_edit_millis = now_millis;
                pending.timer = timer;
            }
            None => {
                self.pending.insert(
                    field.to_string(),
                    PendingEdit {
                        old_value,
                        new_value,
                        edits: 1,
                        last_edit_millis: now_millis,
                        timer,
                    },
                );
            }
        }
        timer
    }

    /// Hand every burst whose window has elapsed to `commit`, earliest first
    ///
    /// Returns how many bursts were committed.
    pub fn fire_due<F>(&mut self, now_millis: i64, mut commit: F) -> usize
    where
        F: FnMut(CoalescedEdit),
    {
        let due = self.timers.pop_due(now_millis);
        let mut fired = 0;
        for (_, field) in due {
            if let Some(edit) = self.take(field) {
                commit(edit);
                fired += 1;
            }
        }
        fired
    }

    /// Commit every pending burst immediately, earliest due first
    pub fn flush<F>(&mut self, commit: F) -> usize
    where
        F: FnMut(CoalescedEdit),
    {
        self.fire_due(i64::MAX, commit)
    }

    /// Drop the pending burst for one field
    pub fn cancel(&mut self, field: &str) -> bool {
        match self.pending.remove(field) {
            Some(pending) => {
                self.timers.cancel(pending.timer);
                true
            }
            None => false,
        }
    }

    /// Drop every pending burst, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        self.timers.clear();
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.pending.contains_key(field)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// When the next burst will become due
    pub fn next_due(&self) -> Option<i64> {
        self.timers.next_due()
    }

    fn take(&mut self, field: String) -> Option<CoalescedEdit> {
        let pending = self.pending.remove(&field)?;
        Some(CoalescedEdit {
            field,
            old_value: pending.old_value,
            new_value: pending.new_value,
            edits: pending.edits,
            last_edit_millis: pending.last_edit_millis,
        })
    }
}
