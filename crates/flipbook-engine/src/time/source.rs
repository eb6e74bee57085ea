use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time readings driving a sequencer.
///
/// Readings are offsets from the source's own origin; only differences between
/// readings are meaningful. Implementations must never go backward.
pub trait TimeSource {
    /// Time elapsed since the source's origin.
    fn now(&mut self) -> Duration;
}

/// Wall-clock time source backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-stepped time source for headless hosts and tests.
///
/// Clones share one reading, so a test can hold a handle and advance time
/// while a sequencer owns another handle to the same source.
#[derive(Debug, Clone, Default)]
pub struct ManualTime(Rc<Cell<Duration>>);

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reading.
    pub fn get(&self) -> Duration {
        self.0.get()
    }

    /// Sets the reading. Stepping backward is not supported.
    pub fn set(&self, t: Duration) {
        debug_assert!(t >= self.0.get(), "ManualTime stepped backward");
        self.0.set(t);
    }

    /// Advances the reading by `d`.
    pub fn advance(&self, d: Duration) {
        self.0.set(self.0.get() + d);
    }
}

impl TimeSource for ManualTime {
    fn now(&mut self) -> Duration {
        self.0.get()
    }
}

/// Paces a free-running drive loop between scheduler turns.
///
/// A host with a vsync-aligned callback (a redraw loop, a display link) can
/// implement this to align turns with real frames; [`FixedDelay`] is the
/// fallback when no such source exists.
pub trait FrameSource {
    /// Blocks until the next frame opportunity.
    fn wait_frame(&mut self);
}

/// Fixed-delay timer fallback.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl FrameSource for FixedDelay {
    fn wait_frame(&mut self) {
        thread::sleep(self.delay);
    }
}
