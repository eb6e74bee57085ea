pub mod frame_clock;
pub mod source;

pub use frame_clock::{ClockStatus, FrameClock, DEFAULT_INTERVAL};
pub use source::{FixedDelay, FrameSource, ManualTime, MonotonicTime, TimeSource};
