//! Running many jobs.
//!
//! [`run_batch`] checks each job's inputs, runs the pipeline for the jobs
//! whose inputs are present, and keeps going when a job fails. The batch
//! succeeds only if every job succeeds.
//!
//! # Example
//!
//! ```no_run
//! use stillframes::{BatchConfig, ExtractOptions, Job, run_batch};
//!
//! let batch = BatchConfig::default()
//!     .with_job(Job::new("front.mp4", "front.txt", "out/front"))
//!     .with_job(Job::new("rear.mp4", "rear.txt", "out/rear"));
//! let report = run_batch(&batch, &ExtractOptions::new());
//! for outcome in report.failed_jobs() {
//!     eprintln!("{} failed", outcome.job.name());
//! }
//! std::process::exit(if report.is_success() { 0 } else { 1 });
//! ```

use std::fs;

use crate::{
    configuration::{BatchConfig, ExtractOptions, Job},
    error::ExtractError,
    labels::FrameLabels,
    pipeline::ExtractionReport,
    source::VideoSource,
};

/// What happened to one job.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: Job,
    /// The pipeline report, or the error that stopped the job before or
    /// during setup.
    pub result: Result<ExtractionReport, ExtractError>,
}

impl JobOutcome {
    /// `true` if the job ran and every labelled frame was written.
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(report) if report.is_success())
    }
}

/// Outcomes of every job, in batch order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub jobs: Vec<JobOutcome>,
}

impl BatchReport {
    /// Logical AND over all job outcomes. An empty batch succeeds.
    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(JobOutcome::is_success)
    }

    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobOutcome> {
        self.jobs.iter().filter(|outcome| !outcome.is_success())
    }

    /// Total images written across all jobs.
    pub fn frames_written(&self) -> u64 {
        self.jobs
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .map(|report| report.frames_written)
            .sum()
    }
}

/// Check that a job can start: video and label files exist and the output
/// directory exists or can be created.
///
/// # Errors
///
/// - [`ExtractError::ResourceNotFound`] for a missing video or label file.
/// - [`ExtractError::IoWrite`] if the output directory cannot be created.
pub fn check_job(job: &Job) -> Result<(), ExtractError> {
    if !job.video.exists() {
        return Err(ExtractError::ResourceNotFound {
            path: job.video.clone(),
            reason: "video file does not exist".to_string(),
        });
    }
    if !job.labels.exists() {
        return Err(ExtractError::ResourceNotFound {
            path: job.labels.clone(),
            reason: "label file does not exist".to_string(),
        });
    }
    if !job.output_dir.exists() {
        log::debug!("Creating output directory {}", job.output_dir.display());
        fs::create_dir_all(&job.output_dir).map_err(|source| ExtractError::IoWrite {
            path: job.output_dir.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Run a single job: check it, read its labels, and run the pipeline.
///
/// # Errors
///
/// Returns the first setup error; see [`check_job`], [`FrameLabels::read`],
/// [`VideoSource::open`], and [`VideoSource::extract`].
pub fn run_job(job: &Job, options: &ExtractOptions) -> Result<ExtractionReport, ExtractError> {
    check_job(job)?;
    let labels = FrameLabels::read(&job.labels)?;
    VideoSource::open(&job.video)?.extract(&labels, &job.output_dir, options)
}

/// Run every job in `config` in order.
///
/// Never stops early: a failed job is recorded and the next one starts.
pub fn run_batch(config: &BatchConfig, options: &ExtractOptions) -> BatchReport {
    let mut report = BatchReport::default();

    for (index, job) in config.jobs.iter().enumerate() {
        log::info!(
            "Job {}/{}: {}",
            index + 1,
            config.jobs.len(),
            job.name()
        );
        let result = run_job(job, options);

        match &result {
            Ok(job_report) if job_report.is_success() => {}
            Ok(job_report) => log::error!(
                "Job {} finished with {} failed frames and {} decode errors",
                job.name(),
                job_report.frames_failed,
                job_report.decode_errors,
            ),
            Err(error) => log::error!("Job {} failed: {error}", job.name()),
        }

        report.jobs.push(JobOutcome {
            job: job.clone(),
            result,
        });
    }

    report
}
