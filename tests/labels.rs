//! Label file parsing and cursor tests.

use std::fs;

use stillframes::{ExtractError, FrameLabels};

#[test]
fn blank_lines_are_skipped() {
    let labels = FrameLabels::parse("a\n\nb\n");
    assert_eq!(labels.iter().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn whitespace_only_file_has_no_labels() {
    let labels = FrameLabels::parse("  \n\t\n\n");
    assert!(labels.is_empty());
    assert_eq!(labels.len(), 0);
}

#[test]
fn crlf_line_endings_are_stripped() {
    let labels = FrameLabels::parse("000001\r\n000002\r\n");
    assert_eq!(labels.get(0), Some("000001"));
    assert_eq!(labels.get(1), Some("000002"));
    assert_eq!(labels.get(2), None);
}

#[test]
fn non_blank_lines_are_kept_verbatim() {
    let labels = FrameLabels::parse(" padded \nframe 7\n");
    assert_eq!(labels.get(0), Some(" padded "));
    assert_eq!(labels.get(1), Some("frame 7"));
}

#[test]
fn read_from_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("front.txt");
    fs::write(&path, "000017\n000018\n\n000019").expect("Failed to write labels");

    let labels = FrameLabels::read(&path).expect("Failed to read labels");
    assert_eq!(labels.len(), 3);
    assert_eq!(labels.get(2), Some("000019"));
}

#[test]
fn read_accepts_non_utf8_bytes() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("latin1.txt");
    fs::write(&path, b"caf\xe9\n000002\n").expect("Failed to write labels");

    let labels = FrameLabels::read(&path).expect("non-UTF-8 labels should still be read");
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.get(0), Some("caf\u{FFFD}"));
    assert_eq!(labels.get(1), Some("000002"));
}

#[test]
fn read_missing_file_is_resource_not_found() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing.txt");

    let error = FrameLabels::read(&path).unwrap_err();
    match error {
        ExtractError::ResourceNotFound { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("Expected ResourceNotFound, got: {other:?}"),
    }
}

#[test]
fn cursor_hands_out_each_label_once() {
    let labels = FrameLabels::from(vec!["x".to_string(), "y".to_string()]);
    let mut cursor = labels.cursor();

    assert_eq!(cursor.total(), 2);
    assert_eq!(cursor.next_label(), Some("x"));
    assert!(!cursor.is_exhausted());
    assert_eq!(cursor.next_label(), Some("y"));
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.next_label(), None);
    assert_eq!(cursor.consumed(), 2);
}

#[test]
fn cursor_on_empty_labels_is_exhausted() {
    let labels = FrameLabels::default();
    let mut cursor = labels.cursor();
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.next_label(), None);
    assert_eq!(cursor.consumed(), 0);
}
