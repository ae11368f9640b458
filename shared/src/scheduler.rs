//! Deferred continuation scheduler.
//!
//! Everything that "waits" (fire delay, reload, chain-bounce pacing, launcher
//! resets) is a task record scheduled here and run later on the same tick
//! thread. The scheduler never calls back into game state itself: `advance`
//! hands due tasks to the caller, which re-validates the owner before acting.

/// Opaque id returned by [`Scheduler::schedule`], used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// A pending continuation.
#[derive(Clone, Debug)]
pub struct ScheduledTask<O, P> {
    pub handle: TaskHandle,
    pub owner: O,
    pub payload: P,
    /// Absolute due time in scheduler seconds.
    pub due: f32,
    /// Re-arm interval for repeating tasks.
    pub repeat: Option<f32>,
}

/// Task that came due during [`Scheduler::advance`].
#[derive(Clone, Debug)]
pub struct DueTask<O, P> {
    pub handle: TaskHandle,
    pub owner: O,
    pub payload: P,
}

#[derive(Debug)]
pub struct Scheduler<O, P> {
    now: f32,
    next_id: u64,
    tasks: Vec<ScheduledTask<O, P>>,
}

impl<O, P> Default for Scheduler<O, P> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<O: Copy + PartialEq, P: Clone> Scheduler<O, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time in seconds.
    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    pub fn pending_for(&self, owner: O) -> usize {
        self.tasks.iter().filter(|t| t.owner == owner).count()
    }

    /// Run `payload` once, `delay` seconds from now.
    pub fn schedule(&mut self, owner: O, delay: f32, payload: P) -> TaskHandle {
        self.push(owner, delay, None, payload)
    }

    /// Run `payload` every `interval` seconds until cancelled.
    pub fn schedule_repeating(&mut self, owner: O, interval: f32, payload: P) -> TaskHandle {
        self.push(owner, interval, Some(interval.max(f32::EPSILON)), payload)
    }

    fn push(&mut self, owner: O, delay: f32, repeat: Option<f32>, payload: P) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            handle,
            owner,
            payload,
            due: self.now + delay.max(0.0),
            repeat,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        before != self.tasks.len()
    }

    /// Cancel every task belonging to `owner`. Returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: O) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    /// Cancel the tasks of `owner` whose payload matches `pred`.
    pub fn cancel_where(&mut self, owner: O, pred: impl Fn(&P) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !(t.owner == owner && pred(&t.payload)));
        before - self.tasks.len()
    }

    /// Advance the clock and return every task that came due, ordered by due
    /// time then scheduling order. One-shot tasks are removed; repeating tasks
    /// fire at most once per call and are re-armed.
    pub fn advance(&mut self, dt: f32) -> Vec<DueTask<O, P>> {
        self.now += dt.max(0.0);
        let now = self.now;

        let mut due: Vec<(f32, TaskHandle, DueTask<O, P>)> = Vec::new();
        let mut kept = Vec::with_capacity(self.tasks.len());

        for mut task in self.tasks.drain(..) {
            if task.due > now {
                kept.push(task);
                continue;
            }

            due.push((
                task.due,
                task.handle,
                DueTask {
                    handle: task.handle,
                    owner: task.owner,
                    payload: task.payload.clone(),
                },
            ));

            if let Some(interval) = task.repeat {
                task.due += interval;
                if task.due <= now {
                    task.due = now + interval;
                }
                kept.push(task);
            }
        }

        self.tasks = kept;
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, _, task)| task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once_when_due() {
        let mut scheduler: Scheduler<u32, &str> = Scheduler::new();
        scheduler.schedule(1, 0.2, "bounce");

        assert!(scheduler.advance(0.1).is_empty());
        let due = scheduler.advance(0.1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].payload, "bounce");
        assert!(scheduler.advance(1.0).is_empty());
    }

    #[test]
    fn test_due_order_is_time_then_insertion() {
        let mut scheduler: Scheduler<u32, u32> = Scheduler::new();
        scheduler.schedule(1, 0.3, 3);
        scheduler.schedule(1, 0.1, 1);
        scheduler.schedule(2, 0.1, 2);

        let order: Vec<u32> = scheduler.advance(0.5).into_iter().map(|t| t.payload).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_and_cancel_owner() {
        let mut scheduler: Scheduler<u32, u32> = Scheduler::new();
        let a = scheduler.schedule(1, 0.1, 10);
        scheduler.schedule(1, 0.1, 11);
        scheduler.schedule(2, 0.1, 20);

        assert!(scheduler.cancel(a));
        assert!(!scheduler.cancel(a));
        assert_eq!(scheduler.cancel_owner(1), 1);

        let due = scheduler.advance(1.0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].owner, 2);
    }

    #[test]
    fn test_repeating_rearms_until_cancelled() {
        let mut scheduler: Scheduler<u32, ()> = Scheduler::new();
        let handle = scheduler.schedule_repeating(7, 0.1, ());

        assert_eq!(scheduler.advance(0.1).len(), 1);
        assert_eq!(scheduler.advance(0.1).len(), 1);
        // One firing per advance even if several intervals elapsed.
        assert_eq!(scheduler.advance(0.5).len(), 1);

        assert!(scheduler.cancel(handle));
        assert!(scheduler.advance(1.0).is_empty());
    }
}
