//! Cancellable timers on a monotonic clock.
//!
//! The dashboard runs on a single loop that calls [`Scheduler::pop_due`] with the
//! time elapsed since start. Each task keeps its own [`TaskHandle`] so it can
//! be cancelled without touching the others. Handles are generational: once
//! a task is cancelled or has fired its last time, its handle goes stale and
//! can never cancel a task created later in the same slot.

use std::time::Duration;

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    slot: usize,
    generation: u64,
}

/// A task popped by [`Scheduler::pop_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<J> {
    pub handle: TaskHandle,
    /// The instant the task was due, which trails `now` when the loop fell behind.
    pub at: Duration,
    pub job: J,
}

#[derive(Debug, Clone)]
struct Task<J> {
    job: J,
    next_at: Duration,
    /// `None` for one-shot tasks.
    period: Option<Duration>,
    /// Registration order, breaks ties between tasks due at the same instant.
    seq: u64,
}

#[derive(Debug, Clone)]
struct Slot<J> {
    generation: u64,
    task: Option<Task<J>>,
}

/// Owner of periodic and one-shot jobs.
#[derive(Debug, Clone)]
pub struct Scheduler<J> {
    slots: Vec<Slot<J>>,
    next_seq: u64,
}

impl<J> Default for Scheduler<J> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<J: Clone> Scheduler<J> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `period`, first at `now + period`. Zero periods are
    /// raised to one millisecond.
    pub fn every(&mut self, now: Duration, period: Duration, job: J) -> TaskHandle {
        let period = period.max(Duration::from_millis(1));
        self.insert(Task {
            job,
            next_at: now + period,
            period: Some(period),
            seq: 0,
        })
    }

    /// Run `job` once at `now + delay`.
    pub fn after(&mut self, now: Duration, delay: Duration, job: J) -> TaskHandle {
        self.insert(Task {
            job,
            next_at: now + delay,
            period: None,
            seq: 0,
        })
    }

    /// Cancel a task. Returns `true` if the handle was live.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.slots.get_mut(handle.slot) {
            Some(slot) if slot.generation == handle.generation && slot.task.is_some() => {
                slot.task = None;
                slot.generation += 1;
                true
            }
            _ => false,
        }
    }

    /// Cancel every task.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.task.take().is_some() {
                slot.generation += 1;
            }
        }
    }

    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.slots
            .get(handle.slot)
            .is_some_and(|s| s.generation == handle.generation && s.task.is_some())
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.task.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Earliest pending fire time.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.slots
            .iter()
            .filter_map(|s| s.task.as_ref().map(|t| t.next_at))
            .min()
    }

    /// Pop the next task due at or before `now`, with its handle and due time.
    ///
    /// Periodic tasks are re-armed one period later, so a loop that fell
    /// behind gets every missed occurrence, in order.
    pub fn pop_due(&mut self, now: Duration) -> Option<Fired<J>> {
        let slot_idx = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.task.as_ref().map(|t| (i, t)))
            .filter(|(_, t)| t.next_at <= now)
            .min_by_key(|(_, t)| (t.next_at, t.seq))
            .map(|(i, _)| i)?;

        let seq = self.bump_seq();
        let slot = &mut self.slots[slot_idx];
        let handle = TaskHandle {
            slot: slot_idx,
            generation: slot.generation,
        };
        let task = slot.task.as_mut()?;
        let job = task.job.clone();
        let at = task.next_at;
        let period = task.period;
        match period {
            Some(period) => {
                task.next_at += period;
                task.seq = seq;
            }
            None => {
                slot.task = None;
                slot.generation += 1;
            }
        }
        Some(Fired { handle, at, job })
    }

    /// All jobs due at or before `now`, in fire order.
    pub fn due(&mut self, now: Duration) -> Vec<J> {
        let mut fired = Vec::new();
        while let Some(f) = self.pop_due(now) {
            fired.push(f.job);
        }
        fired
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn insert(&mut self, mut task: Task<J>) -> TaskHandle {
        task.seq = self.bump_seq();
        if let Some(slot_idx) = self.slots.iter().position(|s| s.task.is_none()) {
            let slot = &mut self.slots[slot_idx];
            slot.task = Some(task);
            TaskHandle {
                slot: slot_idx,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                task: Some(task),
            });
            TaskHandle {
                slot: self.slots.len() - 1,
                generation: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_periodic_task_fires_each_period() {
        let mut sched = Scheduler::new();
        sched.every(s(0), s(30), "steady");
        assert!(sched.due(s(29)).is_empty());
        assert_eq!(sched.due(s(30)), vec!["steady"]);
        assert!(sched.due(s(30)).is_empty());
        assert_eq!(sched.due(s(60)), vec!["steady"]);
    }

    #[test]
    fn test_missed_periods_fire_in_order() {
        let mut sched = Scheduler::new();
        sched.every(s(0), s(30), "steady");
        sched.every(s(0), s(45), "ratio");
        let fired = sched.due(s(90));
        assert_eq!(fired, vec!["steady", "ratio", "steady", "ratio", "steady"]);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut sched = Scheduler::new();
        let handle = sched.after(s(0), s(3), "toast");
        assert!(sched.is_live(handle));
        assert_eq!(sched.due(s(5)), vec!["toast"]);
        assert!(!sched.is_live(handle));
        assert!(sched.due(s(100)).is_empty());
        assert!(sched.is_empty());
    }

    #[test]
    fn test_cancel_stops_only_that_task() {
        let mut sched = Scheduler::new();
        let a = sched.every(s(0), s(1), "a");
        sched.every(s(0), s(1), "b");
        assert!(sched.cancel(a));
        assert!(!sched.cancel(a));
        assert_eq!(sched.due(s(2)), vec!["b", "b"]);
    }

    #[test]
    fn test_stale_handle_does_not_cancel_new_task() {
        let mut sched = Scheduler::new();
        let old = sched.every(s(0), s(1), "tick");
        sched.cancel(old);
        let new = sched.every(s(0), s(1), "tick");
        assert!(!sched.cancel(old));
        assert!(sched.is_live(new));
        assert_eq!(sched.due(s(1)), vec!["tick"]);
    }

    #[test]
    fn test_ties_break_by_registration() {
        let mut sched = Scheduler::new();
        sched.after(s(0), s(5), 1);
        sched.after(s(0), s(5), 2);
        sched.after(s(0), s(5), 3);
        assert_eq!(sched.due(s(5)), vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut sched = Scheduler::new();
        sched.every(Duration::ZERO, Duration::ZERO, ());
        assert_eq!(sched.due(Duration::from_millis(3)).len(), 3);
    }

    #[test]
    fn test_clear_and_deadline() {
        let mut sched = Scheduler::new();
        let h = sched.every(s(0), s(10), "x");
        sched.after(s(0), s(4), "y");
        assert_eq!(sched.next_deadline(), Some(s(4)));
        assert_eq!(sched.len(), 2);
        sched.clear();
        assert!(sched.is_empty());
        assert!(!sched.is_live(h));
        assert_eq!(sched.next_deadline(), None);
    }

    #[test]
    fn test_pop_due_reports_handle() {
        let mut sched = Scheduler::new();
        let h = sched.every(s(0), s(1), "tick");
        let fired = sched.pop_due(s(1)).unwrap();
        assert_eq!(fired.handle, h);
        assert_eq!(fired.job, "tick");
    }

    #[test]
    fn test_late_pop_reports_due_time() {
        let mut sched = Scheduler::new();
        sched.every(s(0), s(30), "steady");
        let at: Vec<Duration> = std::iter::from_fn(|| sched.pop_due(s(95)).map(|f| f.at)).collect();
        assert_eq!(at, vec![s(30), s(60), s(90)]);
    }
}
