//! Chainable sprite-animation sequences.
//!
//! [`Animation`] is the user-facing builder: queue image preloads,
//! position/frame tasks, repeats and waits, then drive the sequence with a
//! real-time loop or by hand. The clock and scheduler live in
//! `flipbook-engine`; file preloading lives in `flipbook-loader`.

mod animation;
mod preload;
mod target;

pub use animation::Animation;
pub use preload::{FilePreloader, ImageLoader};
pub use target::{SharedTarget, Sprite, VisualTarget};

pub use flipbook_engine::SequenceError;
pub use flipbook_engine::task::{QueueStatus, TaskCtl};
pub use flipbook_engine::time::{
    FixedDelay, FrameSource, ManualTime, MonotonicTime, TimeSource, DEFAULT_INTERVAL,
};
pub use flipbook_loader::ImageList;
