//! Opening a video container and its decoder.
//!
//! [`VideoSource::open`] performs the setup steps of a job in order: open the
//! container, read its stream information, pick the first video stream, and
//! check that a decoder exists for it. Each step fails with its own
//! [`ExtractError`] variant. The container is closed when the `VideoSource`
//! is dropped, on success and on every error path after it was opened.

use std::{
    ffi::CString,
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    ptr,
};

use ffmpeg_next::{
    Error as FfmpegError, codec::context::Context as CodecContext, decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    media::Type,
};
use ffmpeg_sys_next::{
    AVFormatContext, avcodec_default_get_format, avformat_find_stream_info, avformat_open_input,
};

use crate::{error::ExtractError, metadata::StreamInfo};

/// An opened video container with its selected video stream.
pub struct VideoSource {
    pub(crate) input: Input,
    pub(crate) stream: StreamInfo,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open `path` and select its first video stream.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::ContainerOpen`] if the file is missing or not a
    ///   recognised container.
    /// - [`ExtractError::StreamInfo`] if stream information cannot be read.
    /// - [`ExtractError::NoVideoStream`] if there is no video stream or no
    ///   decoder for its codec.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        log::debug!("Opening video container: {}", path.display());

        let input = open_container(path)?;
        let stream = select_video_stream(&input)?;
        log::debug!("Selected {stream}");

        Ok(Self {
            input,
            stream,
            path: path.to_path_buf(),
        })
    }

    /// Metadata of the selected video stream.
    pub fn stream(&self) -> &StreamInfo {
        &self.stream
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a software decoder for the selected stream.
    ///
    /// The decoder never attaches a hardware device, so decoded frames are
    /// always in host memory.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::DecoderOpen`] if the decoder cannot be created
    /// from the stream parameters or fails to open.
    pub(crate) fn open_decoder(&self) -> Result<VideoDecoder, ExtractError> {
        let stream = self.input.stream(self.stream.index).ok_or_else(|| {
            ExtractError::DecoderOpen(format!("stream #{} disappeared", self.stream.index))
        })?;

        let mut context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| ExtractError::DecoderOpen(error.to_string()))?;

        unsafe {
            let raw = context.as_mut_ptr();
            (*raw).hw_device_ctx = ptr::null_mut();
            (*raw).get_format = Some(avcodec_default_get_format);
        }

        context
            .decoder()
            .video()
            .map_err(|error| ExtractError::DecoderOpen(error.to_string()))
    }
}

fn open_container(path: &Path) -> Result<Input, ExtractError> {
    let open_error = |reason: String| ExtractError::ContainerOpen {
        path: path.to_path_buf(),
        reason,
    };

    ffmpeg_next::init()
        .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

    let c_path = path
        .to_str()
        .and_then(|text| CString::new(text).ok())
        .ok_or_else(|| open_error("path is not valid UTF-8 or contains a NUL byte".to_string()))?;

    let mut raw: *mut AVFormatContext = ptr::null_mut();
    let status =
        unsafe { avformat_open_input(&mut raw, c_path.as_ptr(), ptr::null_mut(), ptr::null_mut()) };
    if status != 0 {
        return Err(open_error(FfmpegError::from(status).to_string()));
    }

    // From here on `input` owns the context and closes it when dropped.
    let input = unsafe { Input::wrap(raw) };

    let status = unsafe { avformat_find_stream_info(raw, ptr::null_mut()) };
    if status < 0 {
        return Err(ExtractError::StreamInfo(FfmpegError::from(status).to_string()));
    }

    Ok(input)
}

fn select_video_stream(input: &Input) -> Result<StreamInfo, ExtractError> {
    let stream = input
        .streams()
        .find(|stream| stream.parameters().medium() == Type::Video)
        .ok_or_else(|| ExtractError::NoVideoStream("container has no video stream".to_string()))?;

    let parameters = stream.parameters();
    let codec_id = parameters.id();
    let codec = ffmpeg_next::decoder::find(codec_id).ok_or_else(|| {
        ExtractError::NoVideoStream(format!("no decoder available for codec {codec_id:?}"))
    })?;

    let context = CodecContext::from_parameters(parameters)
        .map_err(|error| ExtractError::StreamInfo(error.to_string()))?;
    let (width, height, pixel_format) = unsafe {
        let raw = &*context.as_ptr();
        (raw.width, raw.height, Pixel::from(raw.pix_fmt))
    };

    if width <= 0 || height <= 0 || pixel_format == Pixel::None {
        return Err(ExtractError::StreamInfo(format!(
            "stream #{} has undetermined geometry ({width}x{height}, {pixel_format:?})",
            stream.index(),
        )));
    }

    Ok(StreamInfo {
        index: stream.index(),
        codec: codec.name().to_string(),
        width: width as u32,
        height: height as u32,
        pixel_format,
    })
}
