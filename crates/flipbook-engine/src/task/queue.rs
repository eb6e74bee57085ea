use std::time::Duration;

use crate::SequenceError;
use crate::time::FrameClock;

use super::task::{Signal, Task, TaskCtl, TaskKind};

/// Queue lifecycle state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QueueStatus {
    Initial,
    Running,
    Paused,
    /// Terminal: the task list and clock have been released.
    Disposed,
}

/// Ordered task list driven cooperatively by a host tick stream.
///
/// The queue never blocks. The host repeatedly calls [`pump`](TaskQueue::pump)
/// with monotonic `now` readings; synchronous tasks run to completion on the
/// calling turn, asynchronous tasks receive one invocation per eligible frame
/// of the owned [`FrameClock`] until they signal completion. When the cursor
/// passes the last task the queue disposes itself.
///
/// Tasks execute strictly in queue order, except for rewinds raised by
/// [`Task::repeat`].
pub struct TaskQueue {
    tasks: Vec<Task>,
    cursor: usize,
    status: QueueStatus,
    clock: FrameClock,
    /// Deadline carried over from a completed task's wait.
    resume_at: Option<Duration>,
    /// Cursor whose async clock run is live; cleared on any cursor movement.
    armed: Option<usize>,
}

impl TaskQueue {
    pub fn new(interval: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            cursor: 0,
            status: QueueStatus::Initial,
            clock: FrameClock::new(interval),
            resume_at: None,
            armed: None,
        }
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn interval(&self) -> Duration {
        self.clock.interval()
    }

    /// Current task position. Always `<= len()`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.status == QueueStatus::Disposed
    }

    /// Appends a task. Permitted after `start()` — the task queues behind the
    /// cursor. Appending to a disposed queue is rejected; build a new queue
    /// instead.
    pub fn push(&mut self, task: Task) {
        if self.status == QueueStatus::Disposed {
            log::warn!("task append rejected: queue is disposed");
            return;
        }
        self.tasks.push(task);
    }

    /// Sets the post-completion wait on the most recently appended task.
    ///
    /// # Panics
    /// Panics when no task has been appended yet; that is a builder bug and
    /// is surfaced immediately rather than deferred.
    pub fn set_wait(&mut self, wait: Duration) {
        match self.tasks.last_mut() {
            Some(task) => task.set_wait(wait),
            None => panic!("wait set before any task was queued"),
        }
    }

    /// Starts the queue and runs it up to the first suspension point.
    ///
    /// No-op unless the queue is `Initial` and non-empty. A leading run of
    /// synchronous tasks completes before this returns.
    pub fn start(&mut self, now: Duration) -> Result<(), SequenceError> {
        if self.status != QueueStatus::Initial || self.tasks.is_empty() {
            return Ok(());
        }
        self.status = QueueStatus::Running;
        log::debug!("task queue started with {} task(s)", self.tasks.len());
        self.pump(now)
    }

    /// Suspends execution and frame delivery. Only valid from `Running`.
    ///
    /// A synchronous task already on the calling turn is unaffected; sync
    /// tasks always run to completion.
    pub fn pause(&mut self, now: Duration) {
        if self.status != QueueStatus::Running {
            return;
        }
        self.status = QueueStatus::Paused;
        self.clock.pause(now);
    }

    /// Resumes a paused queue. Only valid from `Paused`.
    pub fn restart(&mut self, now: Duration) {
        if self.status != QueueStatus::Paused {
            return;
        }
        self.status = QueueStatus::Running;
        self.clock.restart(now);
    }

    /// Releases the task list and enters the terminal state. Idempotent.
    pub fn dispose(&mut self) {
        if self.status == QueueStatus::Disposed {
            return;
        }
        self.status = QueueStatus::Disposed;
        self.tasks.clear();
        self.cursor = 0;
        self.resume_at = None;
        self.armed = None;
        log::debug!("task queue disposed");
    }

    /// Runs one scheduler turn at `now`.
    ///
    /// Returns immediately unless the queue is running and any pending wait
    /// deadline has passed. Sync completions and repeat rewinds continue
    /// within the same turn via an explicit work loop, so arbitrarily long
    /// repeat chains cannot grow the stack.
    pub fn pump(&mut self, now: Duration) -> Result<(), SequenceError> {
        loop {
            if self.status != QueueStatus::Running {
                return Ok(());
            }
            if let Some(deadline) = self.resume_at {
                if now < deadline {
                    return Ok(());
                }
                self.resume_at = None;
            }
            if self.cursor == self.tasks.len() {
                self.dispose();
                return Ok(());
            }

            let idx = self.cursor;
            let mut ctl = TaskCtl::new();
            let signal = match self.tasks[idx].kind() {
                TaskKind::Sync => {
                    self.tasks[idx].run_sync(&mut ctl);
                    // A sync task returning unsignaled has broken its
                    // run-to-completion contract; treat it like failure.
                    ctl.take().unwrap_or(Signal::Complete(false))
                },
                TaskKind::Async => {
                    if self.armed != Some(idx) {
                        self.clock.start(now);
                        self.armed = Some(idx);
                    }
                    let Some(elapsed) = self.clock.on_tick(now) else {
                        return Ok(());
                    };
                    self.tasks[idx].run_frame(&mut ctl, elapsed);
                    match ctl.take() {
                        Some(signal) => signal,
                        // Still running; the next eligible frame re-invokes it.
                        None => return Ok(()),
                    }
                },
            };

            match signal {
                Signal::Complete(true) => self.advance(idx, now),
                Signal::Complete(false) => return Err(self.abort(idx)),
                Signal::Rewind(step) => self.rewind(idx, step),
            }
        }
    }

    /// Moves past the task at `finished`, honoring its wait.
    fn advance(&mut self, finished: usize, now: Duration) {
        self.clock.pause(now);
        self.armed = None;
        self.cursor += 1;
        if let Some(wait) = self.tasks[finished].wait() {
            self.resume_at = Some(now + wait);
        }
    }

    /// Rewinds the cursor `step` positions back from the repeat task at `at`.
    fn rewind(&mut self, at: usize, step: usize) {
        self.armed = None;
        self.cursor = at.saturating_sub(step);
    }

    fn abort(&mut self, index: usize) -> SequenceError {
        let remaining = self.tasks.len() - index - 1;
        log::error!("task {index} failed; aborting queue ({remaining} unexecuted)");
        self.dispose();
        SequenceError::new(index, remaining)
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.tasks.len())
            .field("cursor", &self.cursor)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Shared execution trace: each completed task pushes its tag.
    fn trace() -> Rc<RefCell<Vec<usize>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn tag_task(trace: &Rc<RefCell<Vec<usize>>>, tag: usize) -> Task {
        let trace = Rc::clone(trace);
        Task::sync(move |ctl| {
            trace.borrow_mut().push(tag);
            ctl.complete(true);
        })
    }

    // ── ordering & disposal ───────────────────────────────────────────────

    #[test]
    fn tasks_run_in_queue_order() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        for tag in 0..5 {
            q.push(tag_task(&log, tag));
        }
        q.start(ms(0)).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]);
        assert!(q.is_disposed());
    }

    #[test]
    fn queue_disposes_exactly_once_at_the_end() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.start(ms(0)).unwrap();
        assert!(q.is_disposed());
        // Further pumps are no-ops on the terminal state.
        q.pump(ms(500)).unwrap();
        assert!(q.is_disposed());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn start_requires_initial_and_nonempty() {
        let mut q = TaskQueue::new(ms(100));
        q.start(ms(0)).unwrap();
        assert_eq!(q.status(), QueueStatus::Initial);

        let log = trace();
        q.push(tag_task(&log, 0));
        q.start(ms(0)).unwrap();
        assert!(q.is_disposed());
        // Starting a disposed queue is a no-op.
        q.start(ms(0)).unwrap();
        assert!(q.is_disposed());
    }

    #[test]
    fn push_after_dispose_is_rejected() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.start(ms(0)).unwrap();
        assert!(q.is_disposed());
        q.push(tag_task(&log, 1));
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn tasks_appended_after_start_still_run() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        // Head task never completes, so the queue stays alive while we append.
        q.push(Task::frames(|_, _| {}));
        q.start(ms(0)).unwrap();
        q.push(tag_task(&log, 2));
        assert_eq!(q.len(), 3);
        assert_eq!(q.cursor(), 1);
    }

    // ── async dispatch ────────────────────────────────────────────────────

    #[test]
    fn async_task_gets_fresh_elapsed_origin() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut q = TaskQueue::new(ms(100));
        {
            let seen = Rc::clone(&seen);
            q.push(Task::frames(move |ctl, elapsed| {
                seen.borrow_mut().push(elapsed);
                if elapsed >= ms(300) {
                    ctl.complete(true);
                }
            }));
        }
        q.start(ms(1000)).unwrap();
        for t in [1100, 1200, 1300] {
            q.pump(ms(t)).unwrap();
        }
        assert_eq!(*seen.borrow(), vec![ms(100), ms(200), ms(300)]);
        assert!(q.is_disposed());
    }

    #[test]
    fn async_frames_are_coalesced_by_the_clock() {
        let fires = Rc::new(RefCell::new(0));
        let mut q = TaskQueue::new(ms(100));
        {
            let fires = Rc::clone(&fires);
            q.push(Task::frames(move |_, _| *fires.borrow_mut() += 1));
        }
        q.start(ms(0)).unwrap();
        for t in 1..=40 {
            // 25ms tick stream against a 100ms interval.
            q.pump(ms(t * 25)).unwrap();
        }
        assert_eq!(*fires.borrow(), 10);
    }

    #[test]
    fn pause_stops_frames_and_restart_resumes_elapsed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut q = TaskQueue::new(ms(100));
        {
            let seen = Rc::clone(&seen);
            q.push(Task::frames(move |_, elapsed| seen.borrow_mut().push(elapsed)));
        }
        q.start(ms(0)).unwrap();
        q.pump(ms(100)).unwrap();
        q.pause(ms(150));
        q.pump(ms(400)).unwrap();
        assert_eq!(seen.borrow().len(), 1);

        q.restart(ms(650));
        q.pump(ms(750)).unwrap();
        // 500ms paused: elapsed continues from 150, not from 650.
        assert_eq!(*seen.borrow(), vec![ms(100), ms(250)]);
    }

    #[test]
    fn lifecycle_noops_from_invalid_states() {
        let mut q = TaskQueue::new(ms(100));
        q.push(Task::frames(|_, _| {}));
        q.restart(ms(0));
        assert_eq!(q.status(), QueueStatus::Initial);
        q.pause(ms(0));
        assert_eq!(q.status(), QueueStatus::Initial);

        q.start(ms(0)).unwrap();
        q.restart(ms(10));
        assert_eq!(q.status(), QueueStatus::Running);
        q.pause(ms(20));
        q.pause(ms(30));
        assert_eq!(q.status(), QueueStatus::Paused);
    }

    // ── repeat ────────────────────────────────────────────────────────────

    #[test]
    fn repeat_reruns_previous_task_times_plus_one() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.push(Task::repeat(1, Some(3)));
        q.push(tag_task(&log, 2));
        q.start(ms(0)).unwrap();
        // repeat(1, 3): the preceding task runs 4 times in total.
        assert_eq!(*log.borrow(), vec![0, 0, 0, 0, 2]);
        assert!(q.is_disposed());
    }

    #[test]
    fn repeat_zero_times_falls_straight_through() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.push(Task::repeat(1, Some(0)));
        q.push(tag_task(&log, 2));
        q.start(ms(0)).unwrap();
        assert_eq!(*log.borrow(), vec![0, 2]);
    }

    #[test]
    fn unbounded_repeat_never_advances_past_the_block() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        // An async brake makes each loop lap consume one frame, so the
        // unbounded repeat suspends instead of spinning forever.
        q.push(tag_task(&log, 0));
        q.push(Task::frames(|ctl, _| ctl.complete(true)));
        q.push(Task::repeat(2, None));
        q.push(tag_task(&log, 3));
        q.start(ms(0)).unwrap();
        for t in 1..=20 {
            q.pump(ms(t * 100)).unwrap();
        }
        assert_eq!(q.status(), QueueStatus::Running);
        assert!(!log.borrow().contains(&3));
        assert!(log.borrow().len() > 5);
    }

    #[test]
    fn repeat_step_reaches_back_over_multiple_tasks() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.push(tag_task(&log, 1));
        q.push(Task::repeat(2, Some(1)));
        q.start(ms(0)).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn repeat_step_past_queue_head_saturates() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.push(Task::repeat(10, Some(1)));
        q.start(ms(0)).unwrap();
        assert_eq!(*log.borrow(), vec![0, 0]);
    }

    #[test]
    fn repeat_over_async_restarts_its_clock() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut q = TaskQueue::new(ms(100));
        {
            let seen = Rc::clone(&seen);
            q.push(Task::frames(move |ctl, elapsed| {
                seen.borrow_mut().push(elapsed);
                if elapsed >= ms(200) {
                    ctl.complete(true);
                }
            }));
        }
        q.push(Task::repeat(1, Some(1)));
        q.start(ms(0)).unwrap();
        for t in 1..=5 {
            q.pump(ms(t * 100)).unwrap();
        }
        // Second lap starts a fresh elapsed origin at the rewind turn.
        assert_eq!(*seen.borrow(), vec![ms(100), ms(200), ms(100), ms(200)]);
        assert!(q.is_disposed());
    }

    // ── waits ─────────────────────────────────────────────────────────────

    #[test]
    fn wait_defers_the_next_task() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.set_wait(ms(500));
        q.push(tag_task(&log, 1));
        q.start(ms(0)).unwrap();
        assert_eq!(*log.borrow(), vec![0]);

        q.pump(ms(499)).unwrap();
        assert_eq!(*log.borrow(), vec![0]);

        q.pump(ms(500)).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1]);
        assert!(q.is_disposed());
    }

    #[test]
    fn wait_applies_after_async_completion() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(Task::frames(|ctl, elapsed| {
            if elapsed >= ms(100) {
                ctl.complete(true);
            }
        }));
        q.set_wait(ms(300));
        q.push(tag_task(&log, 1));
        q.start(ms(0)).unwrap();
        q.pump(ms(100)).unwrap();
        assert!(log.borrow().is_empty());
        q.pump(ms(399)).unwrap();
        assert!(log.borrow().is_empty());
        q.pump(ms(400)).unwrap();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    #[should_panic(expected = "wait set before any task")]
    fn wait_without_tasks_panics() {
        TaskQueue::new(ms(100)).set_wait(ms(10));
    }

    // ── failure ───────────────────────────────────────────────────────────

    #[test]
    fn sync_failure_aborts_with_task_index() {
        let log = trace();
        let mut q = TaskQueue::new(ms(100));
        q.push(tag_task(&log, 0));
        q.push(Task::sync(|ctl| ctl.complete(false)));
        q.push(tag_task(&log, 2));
        q.push(tag_task(&log, 3));
        let err = q.start(ms(0)).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.remaining, 2);
        assert_eq!(*log.borrow(), vec![0]);
        assert!(q.is_disposed());
    }

    #[test]
    fn async_failure_uses_the_same_fatal_policy() {
        let mut q = TaskQueue::new(ms(100));
        q.push(Task::frames(|ctl, _| ctl.complete(false)));
        q.push(Task::sync(|ctl| ctl.complete(true)));
        q.start(ms(0)).unwrap();
        let err = q.pump(ms(100)).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.remaining, 1);
        assert!(q.is_disposed());
    }

    #[test]
    fn sync_task_without_signal_is_fatal() {
        let mut q = TaskQueue::new(ms(100));
        q.push(Task::sync(|_| {}));
        let err = q.start(ms(0)).unwrap_err();
        assert_eq!(err.index, 0);
    }

    #[test]
    fn dispose_is_idempotent_and_reachable_from_initial() {
        let mut q = TaskQueue::new(ms(100));
        q.push(Task::sync(|ctl| ctl.complete(true)));
        q.dispose();
        assert!(q.is_disposed());
        q.dispose();
        assert!(q.is_disposed());
    }
}
