//! Still-image encoding.
//!
//! [`FrameEncoder`] turns one normalized frame into one JPEG. Every call
//! opens its own MJPEG encoder, sends the single frame, and takes back the
//! single packet, so no encoder state is shared between frames. The encoder
//! and packet are dropped before the call returns on every path.
//!
//! # Example
//!
//! ```no_run
//! use ffmpeg_next::frame::Video as VideoFrame;
//! use stillframes::{ENCODER_PIXEL_FORMAT, FrameEncoder};
//!
//! ffmpeg_next::init().unwrap();
//! let mut frame = VideoFrame::new(ENCODER_PIXEL_FORMAT, 64, 48);
//! let jpeg = FrameEncoder::new(90).encode(&mut frame)?;
//! assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
//! # Ok::<(), stillframes::ExtractError>(())
//! ```

use std::{
    fs::File,
    io::{ErrorKind, Result as IoResult, Write},
    os::raw::c_int,
    path::Path,
};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Id, context::Context as CodecContext, flag::Flags as CodecFlags},
    frame::Video as VideoFrame,
    util::color::Range as ColorRange,
};

use crate::{
    configuration::{MAX_QUALITY, MIN_QUALITY},
    error::ExtractError,
    normalize::ENCODER_PIXEL_FORMAT,
};

/// Best (smallest) MJPEG quantizer scale.
pub const BEST_QUANTIZER: u32 = 2;
/// Worst (largest) MJPEG quantizer scale.
pub const WORST_QUANTIZER: u32 = 31;

/// Map a 1–100 quality (100 = best) onto the MJPEG quantizer range 2–31.
///
/// Out-of-range qualities are clamped first.
pub fn quality_to_quantizer(quality: u8) -> u32 {
    let quality = u32::from(quality.clamp(MIN_QUALITY, MAX_QUALITY));
    let span = WORST_QUANTIZER - BEST_QUANTIZER;
    let steps = u32::from(MAX_QUALITY - MIN_QUALITY);
    BEST_QUANTIZER + ((u32::from(MAX_QUALITY) - quality) * span + steps / 2) / steps
}

/// Encodes single frames as JPEG at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    quality: u8,
}

impl FrameEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(MIN_QUALITY, MAX_QUALITY),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Quantizer scale used for this encoder's quality.
    pub fn quantizer(&self) -> u32 {
        quality_to_quantizer(self.quality)
    }

    /// Encode `frame` and return the JPEG bytes.
    ///
    /// The frame must already be in [`ENCODER_PIXEL_FORMAT`]; its `quality`
    /// field is overwritten with the encoder's quantizer.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Encode`] if the frame has the wrong format,
    /// the MJPEG encoder is missing or cannot be opened, or the encoder does
    /// not return exactly one packet for the frame.
    pub fn encode(&self, frame: &mut VideoFrame) -> Result<Vec<u8>, ExtractError> {
        if frame.format() != ENCODER_PIXEL_FORMAT {
            return Err(ExtractError::Encode(format!(
                "frame is {:?}, encoder expects {ENCODER_PIXEL_FORMAT:?}",
                frame.format(),
            )));
        }

        let codec = ffmpeg_next::encoder::find(Id::MJPEG)
            .ok_or_else(|| ExtractError::Encode("MJPEG encoder not available".to_string()))?;

        let mut encoder = CodecContext::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|error| {
                ExtractError::Encode(format!("cannot create encoder context: {error}"))
            })?;

        let lambda = self.quantizer() * ffmpeg_sys_next::FF_QP2LAMBDA as u32;

        encoder.set_width(frame.width());
        encoder.set_height(frame.height());
        encoder.set_format(ENCODER_PIXEL_FORMAT);
        encoder.set_color_range(ColorRange::JPEG);
        encoder.set_time_base(Rational::new(1, 30));
        encoder.set_flags(CodecFlags::QSCALE);
        encoder.set_quality(lambda as usize);

        let mut encoder = encoder
            .open_as(codec)
            .map_err(|error| ExtractError::Encode(format!("cannot open encoder: {error}")))?;

        // Fixed-quantizer encoders read the scale from the frame, not the context.
        unsafe {
            (*frame.as_mut_ptr()).quality = lambda as c_int;
        }

        encoder
            .send_frame(frame)
            .map_err(|error| ExtractError::Encode(format!("send_frame failed: {error}")))?;

        let mut packet = Packet::empty();
        encoder.receive_packet(&mut packet).map_err(|error| {
            ExtractError::Encode(format!("encoder returned no packet for the frame: {error}"))
        })?;

        packet
            .data()
            .filter(|data| !data.is_empty())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ExtractError::Encode("encoder returned an empty packet".to_string()))
    }

    /// Encode `frame` and write the JPEG to `path`, replacing any existing file.
    ///
    /// Returns the number of bytes written. A write that stops short of the
    /// full payload is logged as a warning and still counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Encode`] from [`encode`](FrameEncoder::encode),
    /// or [`ExtractError::IoWrite`] if the file cannot be created or written.
    pub fn encode_to_file<P: AsRef<Path>>(
        &self,
        frame: &mut VideoFrame,
        path: P,
    ) -> Result<usize, ExtractError> {
        let path = path.as_ref();
        let payload = self.encode(frame)?;

        let io_error = |source| ExtractError::IoWrite {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_error)?;
        let written = write_payload(&mut file, &payload).map_err(io_error)?;

        if written != payload.len() {
            log::warn!(
                "Incomplete write to {}: expected {} bytes, wrote {written}",
                path.display(),
                payload.len(),
            );
        }
        Ok(written)
    }
}

/// Write `payload` to `writer`, returning how many bytes were accepted.
///
/// Unlike [`Write::write_all`], a writer that stops accepting data (returns
/// `Ok(0)`) ends the loop instead of producing an error, so callers can
/// compare the count against the payload size.
pub fn write_payload<W: Write>(writer: &mut W, payload: &[u8]) -> IoResult<usize> {
    let mut written = 0;
    while written < payload.len() {
        match writer.write(&payload[written..]) {
            Ok(0) => break,
            Ok(count) => written += count,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
    writer.flush()?;
    Ok(written)
}
