use std::time::Duration;

/// Default frame interval: 60 frames per second.
pub const DEFAULT_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Clock lifecycle state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClockStatus {
    Initial,
    Running,
    Paused,
}

/// Pausable frame clock over a free-running tick stream.
///
/// The host feeds monotonic `now` readings (from a [`TimeSource`]) into
/// [`on_tick`]; the clock turns them into at-most-one-per-interval frame
/// events carrying the elapsed time since [`start`], with paused spans
/// subtracted. Readings that arrive faster than the interval are coalesced.
///
/// Lifecycle calls from an invalid state are silent no-ops, so callers can
/// pause/restart unconditionally.
///
/// [`TimeSource`]: super::TimeSource
/// [`on_tick`]: FrameClock::on_tick
/// [`start`]: FrameClock::start
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    status: ClockStatus,
    started_at: Duration,
    paused_at: Duration,
    total_paused: Duration,
    last_tick: Duration,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            status: ClockStatus::Initial,
            started_at: Duration::ZERO,
            paused_at: Duration::ZERO,
            total_paused: Duration::ZERO,
            last_tick: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    /// Starts (or restarts from scratch) at `now`.
    ///
    /// No-op when already running. Starting from `Paused` discards the old
    /// run entirely; use [`restart`](FrameClock::restart) to resume one.
    pub fn start(&mut self, now: Duration) {
        if self.status == ClockStatus::Running {
            return;
        }
        self.status = ClockStatus::Running;
        self.started_at = now;
        self.total_paused = Duration::ZERO;
        self.last_tick = now;
    }

    /// Suspends frame delivery. Only valid from `Running`.
    pub fn pause(&mut self, now: Duration) {
        if self.status != ClockStatus::Running {
            return;
        }
        self.status = ClockStatus::Paused;
        self.paused_at = now;
    }

    /// Resumes a paused run, folding the paused span into the accounting so
    /// elapsed time continues where it left off. Only valid from `Paused`.
    pub fn restart(&mut self, now: Duration) {
        if self.status != ClockStatus::Paused {
            return;
        }
        self.status = ClockStatus::Running;
        self.total_paused += now.saturating_sub(self.paused_at);
        self.last_tick = now;
    }

    /// Elapsed run time at `now`: wall time since start minus paused spans.
    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
            .saturating_sub(self.total_paused)
    }

    /// Feeds one tick. Returns the elapsed reading when a frame fires, i.e.
    /// when the clock is running and at least one interval has passed since
    /// the previous fire.
    pub fn on_tick(&mut self, now: Duration) -> Option<Duration> {
        if self.status != ClockStatus::Running {
            return None;
        }
        if now.saturating_sub(self.last_tick) < self.interval {
            return None;
        }
        self.last_tick = now;
        Some(self.elapsed(now))
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
