//! Frame label lists.
//!
//! A label file is plain text with one output name per line. Line *i* names
//! the *i*-th frame the decoder emits. Blank lines are skipped; every other
//! line is kept exactly as written, so the labels must already be valid file
//! stems for the target filesystem.
//!
//! # Example
//!
//! ```
//! use stillframes::FrameLabels;
//!
//! let labels = FrameLabels::parse("000017\n\n000018\n");
//! assert_eq!(labels.len(), 2);
//! assert_eq!(labels.get(1), Some("000018"));
//! ```

use std::{borrow::Cow, fs, path::Path};

use crate::error::ExtractError;

/// Ordered, blank-filtered list of output labels for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameLabels {
    labels: Vec<String>,
}

impl FrameLabels {
    /// Read labels from a text file.
    ///
    /// Bytes that are not valid UTF-8 are replaced with `U+FFFD` rather than
    /// rejecting the file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ResourceNotFound`] if the file does not exist
    /// or cannot be opened.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|error| ExtractError::ResourceNotFound {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        let text = String::from_utf8_lossy(&bytes);
        if matches!(text, Cow::Owned(_)) {
            log::warn!("{} is not valid UTF-8; invalid bytes were replaced", path.display());
        }
        let labels = Self::parse(&text);
        log::debug!("Read {} labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Split `text` into labels, dropping empty and whitespace-only lines.
    pub fn parse(text: &str) -> Self {
        let labels = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect();
        Self { labels }
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no labels were found.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The label at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Iterate labels in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Start consuming labels from the beginning.
    pub fn cursor(&self) -> LabelCursor<'_> {
        LabelCursor {
            labels: self,
            position: 0,
        }
    }
}

impl From<Vec<String>> for FrameLabels {
    fn from(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

/// Forward-only position in a [`FrameLabels`] list.
///
/// Each decoded frame takes exactly one label whether or not it is written
/// successfully, which keeps every later frame aligned with its label.
#[derive(Debug, Clone)]
pub struct LabelCursor<'a> {
    labels: &'a FrameLabels,
    position: usize,
}

impl<'a> LabelCursor<'a> {
    /// Take the next label, or `None` once every label has been consumed.
    pub fn next_label(&mut self) -> Option<&'a str> {
        let label = self.labels.get(self.position)?;
        self.position += 1;
        Some(label)
    }

    /// How many labels have been consumed.
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// Total number of labels.
    pub fn total(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` once no labels remain.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.labels.len()
    }
}
