use std::collections::{BTreeMap, HashMap};

/// Handle of a scheduled task, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deferred tasks ordered by due time
///
/// Tasks due at the same millisecond fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    due: BTreeMap<(i64, TimerId), T>,
    index: HashMap<TimerId, i64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            due: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    /// Schedule `payload` to become due at `due_millis`
    pub fn schedule_at(&mut self, due_millis: i64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.due.insert((due_millis, id), payload);
        self.index.insert(id, due_millis);
        id
    }

    /// Cancel a task, returning its payload if it had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let due_millis = self.index.remove(&id)?;
        self.due.remove(&(due_millis, id))
    }

    /// Remove and return every task due at or before `now_millis`, earliest first
    pub fn pop_due(&mut self, now_millis: i64) -> Vec<(TimerId, T)> {
        let later = match now_millis.checked_add(1) {
            Some(bound) => self.due.split_off(&(bound, TimerId(0))),
            None => BTreeMap::new(),
        };
        let fired = std::mem::replace(&mut self.due, later);

        fired
            .into_iter()
            .map(|((_, id), payload)| {
                self.index.remove(&id);
                (id, payload)
            })
            .collect()
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<i64> {
        self.due.keys().next().map(|(due, _)| *due)
    }

    /// Drop every pending task, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.due.len();
        self.due.clear();
        self.index.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}
