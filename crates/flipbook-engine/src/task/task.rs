use std::fmt;
use std::time::Duration;

/// How a task occupies the queue.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TaskKind {
    /// Runs to completion on the calling turn and must signal before returning.
    Sync,
    /// Invoked once per eligible frame until it signals completion.
    Async,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Signal {
    Complete(bool),
    Rewind(usize),
}

/// Scheduler handle passed into every task invocation.
///
/// A task reports back through this handle instead of capturing the scheduler:
/// [`complete`](TaskCtl::complete) ends the task, anything else leaves it
/// running. The queue reads the signal after the invocation returns.
#[derive(Debug, Default)]
pub struct TaskCtl {
    signal: Option<Signal>,
}

impl TaskCtl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Signals that the task finished. `ok = false` aborts the whole queue.
    ///
    /// The last signal raised during one invocation wins.
    pub fn complete(&mut self, ok: bool) {
        self.signal = Some(Signal::Complete(ok));
    }

    /// Moves the cursor back `step` positions from this task. Reserved for
    /// [`Task::repeat`]; no other task type may move the cursor.
    pub(crate) fn rewind(&mut self, step: usize) {
        self.signal = Some(Signal::Rewind(step));
    }

    pub(crate) fn take(&mut self) -> Option<Signal> {
        self.signal.take()
    }
}

type SyncFn = Box<dyn FnMut(&mut TaskCtl)>;
type FrameFn = Box<dyn FnMut(&mut TaskCtl, Duration)>;

pub(crate) enum TaskBody {
    Sync(SyncFn),
    Frames(FrameFn),
}

/// One scheduled unit of work in an animation queue.
///
/// Owned exclusively by the queue that holds it. Immutable once enqueued,
/// except for the post-completion wait, settable until the queue finishes the
/// task.
pub struct Task {
    body: TaskBody,
    wait: Option<Duration>,
}

impl Task {
    /// A synchronous task: runs immediately on the scheduler's turn and must
    /// signal `ctl` before returning.
    pub fn sync(f: impl FnMut(&mut TaskCtl) + 'static) -> Self {
        Self { body: TaskBody::Sync(Box::new(f)), wait: None }
    }

    /// An asynchronous task: `f` is invoked with the elapsed run time on each
    /// eligible frame until it calls `ctl.complete`. Frames before that are
    /// pure side-effecting updates.
    pub fn frames(f: impl FnMut(&mut TaskCtl, Duration) + 'static) -> Self {
        Self { body: TaskBody::Frames(Box::new(f)), wait: None }
    }

    /// A repeat task: rewinds the cursor `step` positions (past itself) on
    /// each invocation, `times` times in total — or forever when `times` is
    /// `None`. Once the count is spent it completes and the queue falls
    /// through to the next task.
    ///
    /// `step = 0` is treated as 1.
    pub fn repeat(step: usize, times: Option<u32>) -> Self {
        let step = step.max(1);
        let mut remaining = times;
        Self::sync(move |ctl| match remaining.as_mut() {
            None => ctl.rewind(step),
            Some(0) => ctl.complete(true),
            Some(n) => {
                *n -= 1;
                ctl.rewind(step);
            },
        })
    }

    pub fn kind(&self) -> TaskKind {
        match self.body {
            TaskBody::Sync(_) => TaskKind::Sync,
            TaskBody::Frames(_) => TaskKind::Async,
        }
    }

    /// The post-completion wait, if any.
    pub fn wait(&self) -> Option<Duration> {
        self.wait
    }

    pub(crate) fn set_wait(&mut self, wait: Duration) {
        self.wait = Some(wait);
    }

    pub(crate) fn run_sync(&mut self, ctl: &mut TaskCtl) {
        match &mut self.body {
            TaskBody::Sync(f) => f(ctl),
            TaskBody::Frames(_) => unreachable!("async task dispatched as sync"),
        }
    }

    pub(crate) fn run_frame(&mut self, ctl: &mut TaskCtl, elapsed: Duration) {
        match &mut self.body {
            TaskBody::Frames(f) => f(ctl, elapsed),
            TaskBody::Sync(_) => unreachable!("sync task dispatched as async"),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind())
            .field("wait", &self.wait)
            .finish()
    }
}
