use std::time::Duration;

use flipbook_loader::ImageList;

/// The preloading collaborator as the sequencer sees it: a black-box boolean
/// predicate, delivered exactly once per call. No retry.
pub trait ImageLoader {
    fn load(&mut self, list: &ImageList, timeout: Option<Duration>) -> bool;
}

/// File-system preloader backed by `flipbook-loader`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePreloader;

impl ImageLoader for FilePreloader {
    fn load(&mut self, list: &ImageList, timeout: Option<Duration>) -> bool {
        let report = flipbook_loader::preload(list, timeout);
        log::debug!(
            "preload: {}/{} loaded, {} failed{}",
            report.loaded,
            report.attempted,
            report.failed,
            if report.timed_out { ", timed out" } else { "" }
        );
        report.all_ok()
    }
}
