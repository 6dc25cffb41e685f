//! Extraction and batch configuration.
//!
//! [`ExtractOptions`] carries per-frame settings (JPEG quality, progress
//! callback) into the pipeline. [`BatchConfig`] lists the [`Job`]s the
//! orchestrator runs. Both are plain values built by the caller; nothing is
//! read from global state.
//!
//! # Example
//!
//! ```no_run
//! use stillframes::{BatchConfig, ExtractOptions};
//!
//! let options = ExtractOptions::new().with_quality(90);
//! let batch = BatchConfig::from_prefixes(
//!     "/data/video",
//!     "/data/images",
//!     ["front", "rear", "left", "right"],
//! );
//! assert_eq!(batch.jobs.len(), 4);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::progress::{NoOpProgress, ProgressCallback};

/// Highest JPEG quality.
pub const MAX_QUALITY: u8 = 100;
/// Lowest JPEG quality.
pub const MIN_QUALITY: u8 = 1;

/// Settings applied to every frame of a job.
#[derive(Clone)]
pub struct ExtractOptions {
    /// JPEG quality, 1–100 (100 = best).
    pub(crate) quality: u8,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("quality", &self.quality)
            .field("has_progress", &true)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Defaults: quality 100, no progress callback.
    pub fn new() -> Self {
        Self {
            quality: MAX_QUALITY,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the JPEG quality. Clamped to 1–100.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(MIN_QUALITY, MAX_QUALITY);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The configured JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }
}

/// One unit of work: a video, its label list, and where to write images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Video container to decode.
    pub video: PathBuf,
    /// Text file with one label per line.
    pub labels: PathBuf,
    /// Directory receiving `<label>.jpg` files.
    pub output_dir: PathBuf,
}

impl Job {
    pub fn new(
        video: impl Into<PathBuf>,
        labels: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video: video.into(),
            labels: labels.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Short name for diagnostics: the video's file stem.
    pub fn name(&self) -> String {
        self.video
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.video.display().to_string())
    }
}

/// The full list of jobs for one orchestrator run.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub jobs: Vec<Job>,
}

impl BatchConfig {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// Build jobs for the `<prefix>.mp4` + `<prefix>.txt` layout.
    ///
    /// Each prefix reads `<source_dir>/<prefix>.mp4` and
    /// `<source_dir>/<prefix>.txt` and writes into `<output_root>/<prefix>/`.
    pub fn from_prefixes<I, S>(
        source_dir: impl AsRef<Path>,
        output_root: impl AsRef<Path>,
        prefixes: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source_dir = source_dir.as_ref();
        let output_root = output_root.as_ref();
        let jobs = prefixes
            .into_iter()
            .map(|prefix| {
                let prefix = prefix.as_ref();
                Job::new(
                    source_dir.join(format!("{prefix}.mp4")),
                    source_dir.join(format!("{prefix}.txt")),
                    output_root.join(prefix),
                )
            })
            .collect();
        Self { jobs }
    }

    /// Append a job.
    #[must_use]
    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }
}
