use std::fmt;

/// A fatal scheduling error: a task completed with failure (or a synchronous
/// task returned without signaling), so the queue was aborted.
///
/// The queue encodes a strict sequential contract; there is no partial-failure
/// recovery and no retry. The error names the failed task's position and how
/// many queued tasks never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceError {
    /// 0-based position of the task that failed.
    pub index: usize,
    /// Number of queued tasks after the failed one that never executed.
    pub remaining: usize,
}

impl SequenceError {
    pub(crate) fn new(index: usize, remaining: usize) -> Self {
        Self { index, remaining }
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} failed; queue aborted with {} task(s) unexecuted",
            self.index, self.remaining
        )
    }
}

impl std::error::Error for SequenceError {}
