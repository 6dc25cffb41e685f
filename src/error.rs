//! Error types for the `stillframes` crate.
//!
//! [`ExtractError`] is returned by every fallible operation. Setup failures
//! (missing inputs, container, stream, and decoder problems) abort a single
//! job; per-frame failures (conversion, encoding, writing) are recorded in the
//! job's [`ExtractionReport`](crate::ExtractionReport) instead of aborting the
//! decode loop.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `stillframes` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// An input resource (video or label list) is missing or unreadable.
    #[error("Resource not found at {path}: {reason}")]
    ResourceNotFound {
        /// Path that was looked up.
        path: PathBuf,
        /// Why the resource could not be used.
        reason: String,
    },

    /// The video container could not be opened.
    #[error("Failed to open video container at {path}: {reason}")]
    ContainerOpen {
        /// Path passed to the pipeline.
        path: PathBuf,
        /// Upstream FFmpeg message.
        reason: String,
    },

    /// Stream information could not be determined after opening.
    #[error("Failed to determine stream information: {0}")]
    StreamInfo(String),

    /// No video stream exists, or no decoder is available for its codec.
    #[error("No decodable video stream found: {0}")]
    NoVideoStream(String),

    /// The video decoder could not be created or opened.
    #[error("Failed to open video decoder: {0}")]
    DecoderOpen(String),

    /// A decoded frame could not be converted to the encoder's pixel format.
    #[error("Pixel format conversion failed: {0}")]
    Conversion(String),

    /// A frame could not be encoded as a still image.
    #[error("Failed to encode still image: {0}")]
    Encode(String),

    /// An output file or directory could not be written.
    #[error("Failed to write {path}: {source}")]
    IoWrite {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },
}

impl ExtractError {
    /// `true` for errors that abort a whole job rather than a single frame.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            ExtractError::ResourceNotFound { .. }
                | ExtractError::ContainerOpen { .. }
                | ExtractError::StreamInfo(_)
                | ExtractError::NoVideoStream(_)
                | ExtractError::DecoderOpen(_)
        )
    }
}
