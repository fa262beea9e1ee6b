//! Job queue configuration.

/// Options for a [`JobQueue`](super::JobQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    /// Number of worker threads (at least 1)
    pub workers: usize,

    /// Finished jobs kept for status and result queries; older ones are evicted
    pub keep_finished: usize,
}

impl QueueOptions {
    /// Create new queue options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set how many finished jobs are retained.
    pub fn with_keep_finished(mut self, keep: usize) -> Self {
        self.keep_finished = keep;
        self
    }
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            keep_finished: 100,
        }
    }
}
