//! Scheduled continuations
//!
//! Deferred effects (bulldozer revert, gun volleys) are stored as
//! `(deadline tick, action)` pairs and fired by the tick loop. Nothing blocks.
//! Every entry carries a scope so a level clear or a run reset can drop the
//! timers that would otherwise act on a context that no longer exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifetime a timer is tied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerScope {
    /// Cancelled whenever the current level is cleared
    Level,
    /// Cancelled when the run ends
    Run,
}

/// Deferred actions understood by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedAction {
    /// Bricks become solid again after a bulldozer
    RestoreBrickSolidity,
    /// One shot of a gun volley
    FireBullet,
}

/// Identifies a scheduled entry for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<A> {
    scope: TimerScope,
    action: A,
}

/// Deadline-ordered queue. Entries with equal deadlines fire in scheduling order.
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    entries: BTreeMap<(u64, TimerId), Entry<A>>,
    next_id: u64,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire on the first tick at or after `deadline`
    pub fn schedule(&mut self, deadline: u64, scope: TimerScope, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((deadline, id), Entry { scope, action });
        id
    }

    /// Drop one pending entry. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.entries.keys().find(|(_, tid)| *tid == id).copied();
        match key {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// Drop every pending entry of `scope`. Returns how many were dropped.
    pub fn cancel_scope(&mut self, scope: TimerScope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.scope != scope);
        before - self.entries.len()
    }

    /// Remove and return every action due at `now`, in firing order
    pub fn drain_due(&mut self, now: u64) -> Vec<A> {
        let later = self.entries.split_off(&(now + 1, TimerId(0)));
        let due = std::mem::replace(&mut self.entries, later);
        due.into_values().map(|entry| entry.action).collect()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.keys().any(|(_, tid)| *tid == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(10, TimerScope::Run, "late");
        timers.schedule(5, TimerScope::Run, "early-a");
        timers.schedule(5, TimerScope::Level, "early-b");

        assert!(timers.drain_due(4).is_empty());
        assert_eq!(timers.drain_due(5), vec!["early-a", "early-b"]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.drain_due(100), vec!["late"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel_single_entry() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(3, TimerScope::Level, TimedAction::RestoreBrickSolidity);
        assert!(timers.is_pending(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.drain_due(3).is_empty());
    }

    #[test]
    fn test_cancel_scope_keeps_other_scopes() {
        let mut timers = TimerQueue::new();
        timers.schedule(1, TimerScope::Level, TimedAction::RestoreBrickSolidity);
        timers.schedule(2, TimerScope::Run, TimedAction::FireBullet);
        timers.schedule(3, TimerScope::Run, TimedAction::FireBullet);

        assert_eq!(timers.cancel_scope(TimerScope::Level), 1);
        assert_eq!(timers.drain_due(10), vec![TimedAction::FireBullet, TimedAction::FireBullet]);
    }
}
