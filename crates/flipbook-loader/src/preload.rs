use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::ImageList;

/// Outcome of one [`preload`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries the call tried to load.
    pub attempted: usize,
    /// Entries that decoded successfully before the deadline.
    pub loaded: usize,
    /// Entries that failed to open or decode.
    pub failed: usize,
    /// Whether the deadline cut the call short, abandoning pending entries.
    pub timed_out: bool,
}

impl LoadReport {
    /// True iff every attempted entry loaded within the deadline.
    ///
    /// An empty list never counts as a success.
    pub fn all_ok(&self) -> bool {
        self.attempted > 0 && !self.timed_out && self.failed == 0
    }
}

/// Resolves a whole image list, blocking the caller until every entry has
/// settled or `timeout` elapses.
///
/// Each entry is decoded on its own thread (`image::open` both reads and
/// decodes, so a "loaded" entry is a proven-good file). A failing entry does
/// not end the call early: the remaining entries still settle and the
/// failure shows up in the report. A timeout does end the call early: pending
/// decodes are abandoned, never joined.
pub fn preload(list: &ImageList, timeout: Option<Duration>) -> LoadReport {
    let entries = list.entries();
    if entries.is_empty() {
        log::warn!("preload of an empty image list");
        return LoadReport::default();
    }

    let (tx, rx) = mpsc::channel::<(String, Result<(), String>)>();
    for (seq, entry) in entries.iter().enumerate() {
        // Call-local labels; no shared counter across preload calls.
        let label = format!("image_{}_{}", entry.name, seq);
        let src = entry.src.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let outcome = image::open(&src)
                .map(|_| ())
                .map_err(|err| format!("{src}: {err}"));
            // After a timeout the receiver is gone; the outcome is dropped.
            let _ = tx.send((label, outcome));
        });
    }
    drop(tx);

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut report = LoadReport { attempted: entries.len(), ..LoadReport::default() };

    for _ in 0..entries.len() {
        let received = match deadline {
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(left) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => {
                        report.timed_out = true;
                        break;
                    },
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            },
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => break,
            },
        };

        match received {
            (label, Ok(())) => {
                report.loaded += 1;
                log::debug!("loaded {label}");
            },
            (label, Err(err)) => {
                report.failed += 1;
                log::warn!("loading {label} failed: {err}");
            },
        }
    }

    if report.timed_out {
        log::warn!(
            "preload timed out with {} of {} entries pending",
            report.attempted - report.loaded - report.failed,
            report.attempted
        );
    }
    report
}
