//! Batch orchestration tests.
//!
//! Fixture-backed tests require `tests/fixtures/generate_fixtures.sh`; the
//! rest build their inputs in a temp directory.

use std::{fs, path::Path};

use stillframes::{BatchConfig, ExtractError, ExtractOptions, Job, check_job, run_batch};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn jpg_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "jpg"))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn empty_batch_succeeds() {
    let report = run_batch(&BatchConfig::default(), &ExtractOptions::new());
    assert!(report.jobs.is_empty());
    assert!(report.is_success());
    assert_eq!(report.frames_written(), 0);
}

#[test]
fn from_prefixes_builds_conventional_layout() {
    let batch = BatchConfig::from_prefixes("video", "images", ["front", "rear"]);

    assert_eq!(
        batch.jobs,
        vec![
            Job::new("video/front.mp4", "video/front.txt", "images/front"),
            Job::new("video/rear.mp4", "video/rear.txt", "images/rear"),
        ]
    );
    assert_eq!(batch.jobs[1].name(), "rear");
}

#[test]
fn missing_video_is_reported_without_running() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let labels = dir.path().join("front.txt");
    fs::write(&labels, "a\nb\n").unwrap();
    let output_dir = dir.path().join("out");
    let job = Job::new(dir.path().join("front.mp4"), &labels, &output_dir);

    let error = check_job(&job).unwrap_err();
    assert!(matches!(error, ExtractError::ResourceNotFound { .. }));

    let report = run_batch(&BatchConfig::new(vec![job]), &ExtractOptions::new());
    assert!(!report.is_success());
    assert!(matches!(
        report.jobs[0].result,
        Err(ExtractError::ResourceNotFound { .. })
    ));
    assert!(!output_dir.exists(), "nothing may be written for a missing video");
}

#[test]
fn missing_labels_are_reported_without_running() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let video = dir.path().join("front.mp4");
    fs::write(&video, b"placeholder").unwrap();
    let job = Job::new(&video, dir.path().join("front.txt"), dir.path().join("out"));

    match check_job(&job).unwrap_err() {
        ExtractError::ResourceNotFound { path, .. } => assert_eq!(path, job.labels),
        other => panic!("Expected ResourceNotFound, got: {other:?}"),
    }
}

#[test]
fn check_job_creates_output_directory() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let video = dir.path().join("front.mp4");
    let labels = dir.path().join("front.txt");
    fs::write(&video, b"placeholder").unwrap();
    fs::write(&labels, "a\n").unwrap();
    let output_dir = dir.path().join("images").join("front");

    check_job(&Job::new(&video, &labels, &output_dir)).expect("check_job should pass");
    assert!(output_dir.is_dir());
}

#[test]
fn unreadable_container_fails_job_and_batch_continues() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source_dir = dir.path().join("video");
    fs::create_dir_all(&source_dir).unwrap();
    fs::write(source_dir.join("front.mp4"), b"this is not a video").unwrap();
    fs::write(source_dir.join("front.txt"), "a\nb\n").unwrap();
    fs::write(source_dir.join("left.txt"), "a\n").unwrap();

    let batch =
        BatchConfig::from_prefixes(&source_dir, dir.path().join("images"), ["front", "left"]);
    let report = run_batch(&batch, &ExtractOptions::new());

    assert_eq!(report.jobs.len(), 2, "every job must be attempted");
    assert!(!report.is_success());
    assert_eq!(report.failed_jobs().count(), 2);

    let front = report.jobs[0].result.as_ref().unwrap_err();
    assert!(front.is_setup_failure(), "got: {front:?}");
    assert!(matches!(
        report.jobs[1].result,
        Err(ExtractError::ResourceNotFound { .. })
    ));
}

#[test]
fn one_bad_job_does_not_stop_a_good_one() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let labels = dir.path().join("labels.txt");
    fs::write(&labels, "000001\n000002\n000003\n").unwrap();
    let good_out = dir.path().join("good");

    let batch = BatchConfig::default()
        .with_job(Job::new(
            dir.path().join("missing.mp4"),
            &labels,
            dir.path().join("bad"),
        ))
        .with_job(Job::new(path, &labels, &good_out));
    let report = run_batch(&batch, &ExtractOptions::new().with_quality(75));

    assert!(!report.is_success(), "one failed job fails the batch");
    assert!(!report.jobs[0].is_success());
    assert!(report.jobs[1].is_success());
    assert_eq!(report.frames_written(), 3);
    assert_eq!(jpg_count(&good_out), 3);
}
