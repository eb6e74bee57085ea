use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use flipbook_engine::SequenceError;
use flipbook_engine::task::{QueueStatus, Task, TaskCtl, TaskQueue};
use flipbook_engine::time::{
    FixedDelay, FrameSource, MonotonicTime, TimeSource, DEFAULT_INTERVAL,
};
use flipbook_loader::ImageList;

use crate::preload::{FilePreloader, ImageLoader};
use crate::target::SharedTarget;

/// A chainable sprite-animation sequence.
///
/// Builder calls queue tasks and return the same instance, so a whole
/// sequence reads as one chain:
///
/// ```rust,ignore
/// let mut anim = Animation::new();
/// anim.load_images(ImageList::from_paths(["walk.png"]), Some(Duration::from_secs(1)))
///     .change_position(sprite.clone(), cells, "walk.png")
///     .repeat(1, 3)
///     .wait(Duration::from_millis(400))
///     .then(|| log::info!("walk finished"));
/// anim.run_to_end()?;
/// ```
///
/// Driving is cooperative: [`run`](Animation::run) paces a real-time loop,
/// while headless hosts and tests construct the animation over a
/// [`ManualTime`](flipbook_engine::time::ManualTime) and call
/// [`pump`](Animation::pump) themselves.
pub struct Animation {
    queue: TaskQueue,
    time: Box<dyn TimeSource>,
    loader: Rc<RefCell<dyn ImageLoader>>,
}

impl Animation {
    /// A sequence at the default 60-per-second interval, wall-clock time, and
    /// file-system preloading.
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_INTERVAL)
    }

    /// A sequence with a custom frame interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self::with_parts(interval, MonotonicTime::new(), FilePreloader)
    }

    /// Full wiring for headless hosts: any time source, any loader.
    pub fn with_parts(
        interval: Duration,
        time: impl TimeSource + 'static,
        loader: impl ImageLoader + 'static,
    ) -> Self {
        debug_assert!(!interval.is_zero(), "frame interval must be positive");
        Self {
            queue: TaskQueue::new(interval),
            time: Box::new(time),
            loader: Rc::new(RefCell::new(loader)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.queue.interval()
    }

    pub fn status(&self) -> QueueStatus {
        self.queue.status()
    }

    pub fn is_disposed(&self) -> bool {
        self.queue.is_disposed()
    }

    // ── builders ──────────────────────────────────────────────────────────

    /// Queues a preload of `list`. The task completes with the loader's
    /// boolean outcome; a failed preload is a broken precondition and aborts
    /// the whole sequence.
    pub fn load_images(&mut self, list: ImageList, timeout: Option<Duration>) -> &mut Self {
        let loader = Rc::clone(&self.loader);
        self.queue.push(Task::sync(move |ctl| {
            let ok = loader.borrow_mut().load(&list, timeout);
            ctl.complete(ok);
        }));
        self
    }

    /// Queues a sheet-offset walk: one cell of `cells` per frame interval on
    /// `target`, using `image_src` as the sheet. Completes once the last cell
    /// has been shown for a full interval.
    ///
    /// Empty `cells` or an empty `image_src` queue a task that fails on its
    /// first frame.
    pub fn change_position(
        &mut self,
        target: SharedTarget,
        cells: Vec<(f32, f32)>,
        image_src: impl Into<String>,
    ) -> &mut Self {
        let src: String = image_src.into();
        if cells.is_empty() || src.is_empty() {
            log::warn!("change_position queued without cells or image source");
            return self.failing_frames();
        }
        let interval = self.queue.interval();
        self.queue.push(Task::frames(move |ctl, elapsed| {
            let index = cell_index(elapsed, interval, cells.len());
            if index >= 1 {
                let (x, y) = cells[index - 1];
                let mut target = target.borrow_mut();
                target.set_image(&src);
                target.set_offset(x, y);
            }
            if index == cells.len() {
                ctl.complete(true);
            }
        }));
        self
    }

    /// Queues an image-source walk: one url of `urls` per frame interval on
    /// `target`. Index and completion behave exactly like
    /// [`change_position`](Animation::change_position).
    pub fn change_src(&mut self, target: SharedTarget, urls: Vec<String>) -> &mut Self {
        if urls.is_empty() {
            log::warn!("change_src queued without urls");
            return self.failing_frames();
        }
        let interval = self.queue.interval();
        self.queue.push(Task::frames(move |ctl, elapsed| {
            let index = cell_index(elapsed, interval, urls.len());
            if index >= 1 {
                target.borrow_mut().set_image(&urls[index - 1]);
            }
            if index == urls.len() {
                ctl.complete(true);
            }
        }));
        self
    }

    /// Queues a caller-supplied per-frame task, the escape hatch for bespoke
    /// frame logic. `f` is invoked with the elapsed run time on every
    /// eligible frame until it calls `ctl.complete`.
    pub fn custom_frame(&mut self, f: impl FnMut(&mut TaskCtl, Duration) + 'static) -> &mut Self {
        self.queue.push(Task::frames(f));
        self
    }

    /// Queues a synchronous side effect between tasks; it always completes
    /// successfully.
    pub fn then(&mut self, mut f: impl FnMut() + 'static) -> &mut Self {
        self.queue.push(Task::sync(move |ctl| {
            f();
            ctl.complete(true);
        }));
        self
    }

    /// Queues a rewind of `step` tasks, re-executed `times` times before
    /// falling through. `repeat(1, k)` runs the immediately preceding task
    /// `k + 1` times in total.
    pub fn repeat(&mut self, step: usize, times: u32) -> &mut Self {
        self.queue.push(Task::repeat(step, Some(times)));
        self
    }

    /// Queues an endless rewind of the immediately preceding task.
    pub fn repeat_forever(&mut self) -> &mut Self {
        self.queue.push(Task::repeat(1, None));
        self
    }

    /// Sets a wait between the most recently queued task's completion and the
    /// next task's start.
    ///
    /// # Panics
    /// Panics when nothing has been queued yet.
    pub fn wait(&mut self, wait: Duration) -> &mut Self {
        self.queue.set_wait(wait);
        self
    }

    fn failing_frames(&mut self) -> &mut Self {
        self.queue.push(Task::frames(|ctl, _| ctl.complete(false)));
        self
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Starts the sequence; a leading run of synchronous tasks (image
    /// preloads, `then` blocks) completes before this returns. No-op unless
    /// the sequence is freshly built and non-empty.
    pub fn start(&mut self) -> Result<(), SequenceError> {
        let now = self.time.now();
        self.queue.start(now)
    }

    /// Suspends frame delivery and elapsed time. Only valid while running.
    pub fn pause(&mut self) {
        let now = self.time.now();
        self.queue.pause(now);
    }

    /// Resumes a paused sequence where it left off. Only valid while paused.
    pub fn restart(&mut self) {
        let now = self.time.now();
        self.queue.restart(now);
    }

    /// Releases the task queue. Idempotent; a disposed sequence ignores
    /// everything except being dropped.
    pub fn dispose(&mut self) {
        self.queue.dispose();
    }

    /// Runs one scheduler turn at the current time reading.
    pub fn pump(&mut self) -> Result<(), SequenceError> {
        let now = self.time.now();
        self.queue.pump(now)
    }

    /// Starts the sequence and pumps it to disposal, paced by `frames`.
    ///
    /// Expects a freshly built sequence. A task that never completes keeps
    /// this loop alive; that is the caller's contract, not a detected fault.
    pub fn run(&mut self, frames: &mut dyn FrameSource) -> Result<(), SequenceError> {
        self.start()?;
        while !self.queue.is_disposed() {
            frames.wait_frame();
            self.pump()?;
        }
        Ok(())
    }

    /// [`run`](Animation::run) paced by the fixed-delay fallback at the
    /// sequence's own frame interval.
    pub fn run_to_end(&mut self) -> Result<(), SequenceError> {
        let mut frames = FixedDelay::new(self.queue.interval());
        self.run(&mut frames)
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps elapsed run time to a 1-based cell index, capped at `len`.
///
/// The clock fires no earlier than one interval in, so a delivered frame
/// always lands on index ≥ 1; the index 0 window exists only for hosts that
/// tick out of band and is a deliberate no-op.
fn cell_index(elapsed: Duration, interval: Duration, len: usize) -> usize {
    ((elapsed.as_nanos() / interval.as_nanos()) as usize).min(len)
}
