//! Timer Scheduler
//!
//! A virtual millisecond clock with interval and one-shot timers, standing
//! in for the host's `setInterval` / `setTimeout` / `clearInterval`. Time
//! only moves when the owner calls `pop_due` or `advance_to`, which makes
//! every timer-driven behavior deterministic under test.

use std::fmt;

use log::debug;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Interval { period_ms: u64 },
    Timeout,
}

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    due_ms: u64,
    /// Tie-breaker for timers due at the same instant
    seq: u64,
    kind: TimerKind,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    /// Scheduler time at which it fired
    pub at_ms: u64,
}

/// Host timer facility
///
/// # Example
/// ```
/// use aura::engine::Scheduler;
///
/// let mut scheduler = Scheduler::new();
/// let tick = scheduler.set_interval(5000);
/// assert!(scheduler.pop_due(4999).is_none());
/// assert_eq!(scheduler.pop_due(10_000).unwrap().handle, tick);
/// assert_eq!(scheduler.pop_due(10_000).unwrap().at_ms, 10_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    /// Create a scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Current time in seconds
    pub fn now_secs(&self) -> f64 {
        self.now_ms as f64 / 1000.0
    }

    /// Call back every `period_ms` (minimum 1 ms) until cleared
    pub fn set_interval(&mut self, period_ms: u64) -> TimerHandle {
        let period_ms = period_ms.max(1);
        self.schedule(period_ms, TimerKind::Interval { period_ms })
    }

    /// Call back once after `delay_ms`
    pub fn set_timeout(&mut self, delay_ms: u64) -> TimerHandle {
        self.schedule(delay_ms, TimerKind::Timeout)
    }

    /// Cancel a timer. Returns false if it already fired or was cleared.
    pub fn clear(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        let removed = self.timers.len() != before;
        if removed {
            debug!("cleared {}", handle);
        }
        removed
    }

    /// Whether the timer is still scheduled
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    /// Number of scheduled timers
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Time of the earliest scheduled timer
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Fire the earliest timer due at or before `until_ms`
    ///
    /// The clock moves to the fired timer's due time. Intervals are
    /// rescheduled one period later; timeouts are removed.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<FiredTimer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(i, _)| i)?;

        let due_ms = self.timers[index].due_ms;
        let handle = self.timers[index].handle;
        self.now_ms = self.now_ms.max(due_ms);

        match self.timers[index].kind {
            TimerKind::Interval { period_ms } => {
                let seq = self.bump_seq();
                let timer = &mut self.timers[index];
                timer.due_ms = due_ms.saturating_add(period_ms);
                timer.seq = seq;
            }
            TimerKind::Timeout => {
                self.timers.remove(index);
            }
        }

        Some(FiredTimer {
            handle,
            at_ms: due_ms,
        })
    }

    /// Move the clock forward without firing anything
    ///
    /// Callers drain `pop_due` first; timers left behind stay due.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn schedule(&mut self, delay_ms: u64, kind: TimerKind) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let seq = self.bump_seq();
        self.timers.push(Timer {
            handle,
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            kind,
        });
        debug!("scheduled {} in {} ms", handle, delay_ms);
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(scheduler: &mut Scheduler, until_ms: u64) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        while let Some(f) = scheduler.pop_due(until_ms) {
            fired.push(f);
        }
        scheduler.advance_to(until_ms);
        fired
    }

    #[test]
    fn test_interval_fires_every_period() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.set_interval(100);
        let fired = drain(&mut scheduler, 350);
        assert_eq!(
            fired.iter().map(|f| f.at_ms).collect::<Vec<_>>(),
            vec![100, 200, 300]
        );
        assert!(fired.iter().all(|f| f.handle == handle));
        assert_eq!(scheduler.now_ms(), 350);
        assert_eq!(scheduler.next_due_ms(), Some(400));
    }

    #[test]
    fn test_timeout_fires_once() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.set_timeout(1500);
        assert!(scheduler.is_active(handle));
        assert_eq!(drain(&mut scheduler, 10_000).len(), 1);
        assert!(!scheduler.is_active(handle));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_clear_prevents_firing() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.set_interval(10);
        assert!(scheduler.clear(handle));
        assert!(!scheduler.clear(handle));
        assert!(drain(&mut scheduler, 1000).is_empty());
    }

    #[test]
    fn test_fires_in_time_order_then_schedule_order() {
        let mut scheduler = Scheduler::new();
        let slow = scheduler.set_timeout(300);
        let first = scheduler.set_timeout(100);
        let second = scheduler.set_timeout(100);
        let order: Vec<_> = drain(&mut scheduler, 1000).iter().map(|f| f.handle).collect();
        assert_eq!(order, vec![first, second, slow]);
    }

    #[test]
    fn test_timers_are_relative_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(1000);
        scheduler.set_timeout(50);
        assert_eq!(scheduler.next_due_ms(), Some(1050));
        // Clock never runs backwards
        scheduler.advance_to(10);
        assert_eq!(scheduler.now_ms(), 1000);
    }

    #[test]
    fn test_zero_period_interval_is_clamped() {
        let mut scheduler = Scheduler::new();
        scheduler.set_interval(0);
        assert_eq!(drain(&mut scheduler, 5).len(), 5);
    }
}
