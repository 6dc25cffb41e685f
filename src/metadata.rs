//! Selected video stream metadata.
//!
//! [`StreamInfo`] is an owned snapshot of the stream the pipeline decodes.
//! It is captured once when the stream is selected and never changes during a
//! run; in particular the frame dimensions are treated as fixed.

use std::fmt::{Display, Formatter, Result as FmtResult};

use ffmpeg_next::format::Pixel;

/// Metadata of the first video stream in a container.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct StreamInfo {
    /// Index of the stream inside its container.
    pub index: usize,
    /// Decoder name (e.g. `"h264"`, `"hevc"`, `"mpeg4"`).
    pub codec: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Native pixel format produced by the decoder.
    pub pixel_format: Pixel,
}

impl StreamInfo {
    /// Pixel format as FFmpeg names it (e.g. `"yuv420p"`).
    pub fn pixel_format_name(&self) -> String {
        self.pixel_format
            .descriptor()
            .map(|descriptor| descriptor.name().to_string())
            .unwrap_or_else(|| format!("{:?}", self.pixel_format))
    }
}

impl Display for StreamInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "stream #{}: {} {}x{} {}",
            self.index,
            self.codec,
            self.width,
            self.height,
            self.pixel_format_name(),
        )
    }
}
