//! Image preloading for the flipbook sequencer.
//!
//! This crate is intentionally standalone; it knows nothing about clocks or
//! task queues. It normalizes the accepted image-list shorthands into
//! [`ImageList`] and resolves a whole list at once with [`preload`], which
//! reports a single all-or-nothing outcome the sequencer can act on.

mod list;
mod preload;

pub use list::{ImageEntry, ImageList};
pub use preload::{preload, LoadReport};
