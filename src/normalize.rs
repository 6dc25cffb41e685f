//! Pixel format normalization.
//!
//! The JPEG encoder is configured for full-range planar 4:2:0
//! ([`ENCODER_PIXEL_FORMAT`]). Frames already in that format go to the
//! encoder as they are, and so do `yuv420p` frames the decoder tagged as
//! full range; those are only retagged. Everything else (including
//! limited-range `yuv420p`) is converted by a swscale context built on first
//! use and reused for the rest of the run. The converter is told the source
//! range of every frame, so full-range input is never expanded twice.
//! Conversion never changes the frame size.

use std::os::raw::c_int;

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::color::Range as ColorRange,
};
use ffmpeg_sys_next::{SWS_CS_DEFAULT, sws_getCoefficients, sws_setColorspaceDetails};

use crate::error::ExtractError;

/// The pixel format every frame has when it reaches the encoder.
pub const ENCODER_PIXEL_FORMAT: Pixel = Pixel::YUVJ420P;

/// Formats passed through without conversion.
///
/// Only the exact encoder format qualifies, so the format tag on a submitted
/// frame always matches the tag the encoder was opened with.
pub const ACCEPTED_PIXEL_FORMATS: &[Pixel] = &[ENCODER_PIXEL_FORMAT];

/// Same memory layout as [`ENCODER_PIXEL_FORMAT`]; only the range tag differs.
const LIMITED_RANGE_TWIN: Pixel = Pixel::YUV420P;

/// swscale's fixed-point unit for contrast and saturation.
const SWS_UNITY: c_int = 1 << 16;

/// A frame guaranteed to be in [`ENCODER_PIXEL_FORMAT`].
#[derive(Debug)]
pub enum NormalizedFrame<'a> {
    /// The decoded frame itself; no copy was made.
    Passthrough(&'a mut VideoFrame),
    /// A freshly allocated, converted copy.
    Converted(VideoFrame),
}

impl NormalizedFrame<'_> {
    pub fn frame(&self) -> &VideoFrame {
        match self {
            NormalizedFrame::Passthrough(frame) => frame,
            NormalizedFrame::Converted(frame) => frame,
        }
    }

    pub fn frame_mut(&mut self) -> &mut VideoFrame {
        match self {
            NormalizedFrame::Passthrough(frame) => frame,
            NormalizedFrame::Converted(frame) => frame,
        }
    }

    /// Returns `true` if the pixels were converted.
    pub fn is_converted(&self) -> bool {
        matches!(self, NormalizedFrame::Converted(_))
    }
}

/// Converts decoded frames to the encoder's pixel format.
///
/// One normalizer serves one pipeline run. Its dimensions are the stream's
/// dimensions and do not change; the conversion context is created lazily on
/// the first frame that needs it.
pub struct PixelNormalizer {
    width: u32,
    height: u32,
    scaler: Option<ScalingContext>,
    /// Source range last configured on `scaler`.
    source_full_range: bool,
}

impl PixelNormalizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scaler: None,
            source_full_range: false,
        }
    }

    /// Returns `true` if frames in `format` with color `range` must be
    /// converted.
    pub fn needs_conversion(format: Pixel, range: ColorRange) -> bool {
        !(ACCEPTED_PIXEL_FORMATS.contains(&format) || is_full_range_twin(format, range))
    }

    /// Returns `true` once a conversion context exists.
    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Bring `frame` into [`ENCODER_PIXEL_FORMAT`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Conversion`] if the frame size differs from the
    /// stream size, the conversion context cannot be created, or the
    /// conversion produces no pixel data.
    pub fn normalize<'a>(
        &mut self,
        frame: &'a mut VideoFrame,
    ) -> Result<NormalizedFrame<'a>, ExtractError> {
        let source_format = frame.format();
        let source_range = frame.color_range();
        if !Self::needs_conversion(source_format, source_range) {
            if source_format != ENCODER_PIXEL_FORMAT {
                frame.set_format(ENCODER_PIXEL_FORMAT);
            }
            return Ok(NormalizedFrame::Passthrough(frame));
        }

        if frame.width() != self.width || frame.height() != self.height {
            return Err(ExtractError::Conversion(format!(
                "frame is {}x{} but the stream is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height,
            )));
        }

        let (width, height) = (self.width, self.height);
        let scaler = match &mut self.scaler {
            Some(scaler) => scaler,
            slot @ None => {
                log::debug!(
                    "Creating {source_format:?} -> {ENCODER_PIXEL_FORMAT:?} converter at {width}x{height}"
                );
                let scaler = ScalingContext::get(
                    source_format,
                    width,
                    height,
                    ENCODER_PIXEL_FORMAT,
                    width,
                    height,
                    ScalingFlags::BILINEAR,
                )
                .map_err(|error| {
                    ExtractError::Conversion(format!(
                        "cannot create converter from {source_format:?}: {error}"
                    ))
                })?;
                self.source_full_range = false;
                slot.insert(scaler)
            }
        };

        let full_range = source_range == ColorRange::JPEG;
        if full_range != self.source_full_range {
            set_source_range(scaler, full_range)?;
            self.source_full_range = full_range;
        }

        let mut converted = VideoFrame::new(ENCODER_PIXEL_FORMAT, width, height);
        scaler
            .run(frame, &mut converted)
            .map_err(|error| ExtractError::Conversion(error.to_string()))?;

        if converted.planes() == 0 || converted.data(0).is_empty() {
            return Err(ExtractError::Conversion(
                "conversion produced no pixel data".to_string(),
            ));
        }

        converted.set_color_range(ColorRange::JPEG);
        converted.set_pts(frame.pts());
        Ok(NormalizedFrame::Converted(converted))
    }
}

fn is_full_range_twin(format: Pixel, range: ColorRange) -> bool {
    format == LIMITED_RANGE_TWIN && range == ColorRange::JPEG
}

/// Tell `scaler` whether its input is full range. The output side stays full
/// range because the target is a `J` format.
fn set_source_range(scaler: &mut ScalingContext, full_range: bool) -> Result<(), ExtractError> {
    log::debug!(
        "Converter source range set to {}",
        if full_range { "full" } else { "limited" }
    );
    let status = unsafe {
        let coefficients = sws_getCoefficients(SWS_CS_DEFAULT as c_int);
        sws_setColorspaceDetails(
            scaler.as_mut_ptr(),
            coefficients,
            c_int::from(full_range),
            coefficients,
            1,
            0,
            SWS_UNITY,
            SWS_UNITY,
        )
    };
    if status < 0 {
        return Err(ExtractError::Conversion(format!(
            "converter rejected the source color range (status {status})"
        )));
    }
    Ok(())
}
