//! Pairing decoded frames with labels.
//!
//! Decoders release frames on their own schedule: a packet may yield zero,
//! one, or several frames, and some frames only appear after end-of-stream.
//! [`drain_frames`] is called after every submitted packet and once more
//! after the end-of-stream signal. It pulls every available frame and gives
//! each one the next label from the [`LabelCursor`], so labels follow the
//! order in which the decoder emits frames across the whole run.
//!
//! The codec side is abstracted by [`FrameSource`] and the output side by
//! [`FrameSink`]; the FFmpeg implementations live in
//! [`pipeline`](crate::pipeline).

use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::{error::ExtractError, labels::LabelCursor};

/// File extension of every written image.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Result of asking a decoder for its next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was written into the caller's buffer.
    Ready,
    /// No frame is available until more input arrives, or the decoder is
    /// fully drained after end-of-stream.
    Empty,
    /// The decoder reported an error other than "no frame ready".
    Failed(String),
}

/// Something that produces decoded frames into a reusable buffer.
pub trait FrameSource {
    type Frame;

    /// Fetch the next available frame into `frame`.
    fn pull_frame(&mut self, frame: &mut Self::Frame) -> FrameStatus;
}

/// Something that persists one labelled frame.
pub trait FrameSink<F> {
    /// Write `frame` for `label` to `destination`.
    fn write_frame(
        &mut self,
        frame: &mut F,
        label: &str,
        destination: &Path,
    ) -> Result<(), ExtractError>;
}

/// Counters for one [`drain_frames`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Frames written successfully.
    pub written: u64,
    /// Frames that consumed a label but failed to convert, encode, or write.
    pub failed: u64,
    /// Frames discarded because every label was already used.
    pub dropped: u64,
    /// Hard decoder error that ended the drain early.
    pub decode_error: Option<String>,
}

impl DrainOutcome {
    /// Frames received from the source during the call.
    pub fn received(&self) -> u64 {
        self.written + self.failed + self.dropped
    }
}

/// Output path for `label`: `<output_dir>/<label>.jpg`.
///
/// The label is appended to the directory as text, so a label that looks
/// like an absolute path still lands inside `output_dir`.
pub fn image_path(output_dir: &Path, label: &str) -> PathBuf {
    let mut path = output_dir.as_os_str().to_owned();
    path.push(MAIN_SEPARATOR_STR);
    path.push(label);
    path.push(".");
    path.push(IMAGE_EXTENSION);
    PathBuf::from(path)
}

/// Pull every frame `source` currently has and hand each to `sink`.
///
/// - Each frame consumes one label, whether or not the sink succeeds.
/// - When the labels run out the frame is discarded and draining stops.
/// - A [`FrameStatus::Failed`] stops draining and is reported in
///   [`DrainOutcome::decode_error`].
pub fn drain_frames<S, K>(
    source: &mut S,
    frame: &mut S::Frame,
    labels: &mut LabelCursor<'_>,
    sink: &mut K,
    output_dir: &Path,
) -> DrainOutcome
where
    S: FrameSource,
    K: FrameSink<S::Frame>,
{
    let mut outcome = DrainOutcome::default();

    loop {
        match source.pull_frame(frame) {
            FrameStatus::Ready => {}
            FrameStatus::Empty => break,
            FrameStatus::Failed(reason) => {
                log::warn!("Decoder error while draining frames: {reason}");
                outcome.decode_error = Some(reason);
                break;
            }
        }

        let Some(label) = labels.next_label() else {
            outcome.dropped += 1;
            break;
        };

        let destination = image_path(output_dir, label);
        match sink.write_frame(frame, label, &destination) {
            Ok(()) => {
                log::debug!("Wrote frame {} -> {}", labels.consumed(), destination.display());
                outcome.written += 1;
            }
            Err(error) => {
                log::warn!("Failed to save frame {}: {error}", destination.display());
                outcome.failed += 1;
            }
        }
    }

    outcome
}
