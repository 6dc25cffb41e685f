//! Progress reporting.
//!
//! A [`ProgressCallback`] is notified every time the pipeline consumes a
//! label, whether the frame was written or failed. Jobs have no cancellation:
//! callbacks observe but cannot stop a running job.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillframes::{ExtractOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} {}", info.frames_done, info.frames_total, info.label);
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// A snapshot taken right after a label was consumed.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Label just consumed.
    pub label: String,
    /// Whether the frame for this label was written.
    pub written: bool,
    /// Labels consumed so far in this job.
    pub frames_done: u64,
    /// Labels available for this job.
    pub frames_total: u64,
    /// Completion percentage (0.0 – 100.0), `None` when there are no labels.
    pub percentage: Option<f32>,
    /// Wall-clock time since the job's pipeline started.
    pub elapsed: Duration,
}

/// Receives progress updates while a job runs.
///
/// Implementations must be [`Send`] and [`Sync`] so one callback can be
/// shared by every job in a batch.
pub trait ProgressCallback: Send + Sync {
    /// Called once per consumed label.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one job and forwards snapshots to the callback.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    done: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: usize) -> Self {
        Self {
            callback,
            total: total as u64,
            done: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one consumed label.
    pub(crate) fn advance(&mut self, label: &str, written: bool) {
        self.done += 1;
        let percentage =
            (self.total > 0).then(|| (self.done as f32 / self.total as f32) * 100.0);
        let info = ProgressInfo {
            label: label.to_owned(),
            written,
            frames_done: self.done,
            frames_total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
        };
        self.callback.on_progress(&info);
    }
}
