//! The per-job decode pipeline.
//!
//! [`VideoSource::extract`] reads every packet of the selected stream, feeds
//! it to a software decoder, and drains the decoder after each packet. Once
//! the container is exhausted the decoder is flushed and drained one last
//! time, so frames it was holding back for reordering still receive labels,
//! after every frame released earlier.
//!
//! Reading stops early once every label has been used, since later frames
//! would be discarded anyway, and on any container read error other than
//! end-of-file.
//!
//! Per-packet and per-frame problems are logged and counted in the returned
//! [`ExtractionReport`]; only setup problems end a job early.
//!
//! # Example
//!
//! ```no_run
//! use stillframes::{ExtractOptions, FrameLabels, VideoSource};
//!
//! let labels = FrameLabels::read("front.txt")?;
//! let report = VideoSource::open("front.mp4")?
//!     .extract(&labels, "out/front", &ExtractOptions::new())?;
//! println!("{} frames written", report.frames_written);
//! # Ok::<(), stillframes::ExtractError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    Error as FfmpegError, Packet, decoder::Video as VideoDecoder, error::EAGAIN,
    frame::Video as VideoFrame,
};

use crate::{
    configuration::ExtractOptions,
    decode::{DrainOutcome, FrameSink, FrameSource, FrameStatus, drain_frames},
    encode::FrameEncoder,
    error::ExtractError,
    labels::FrameLabels,
    metadata::StreamInfo,
    normalize::PixelNormalizer,
    progress::ProgressTracker,
    source::VideoSource,
};

/// Counters describing one finished job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// The stream that was decoded.
    pub stream: StreamInfo,
    /// Labels available to the job.
    pub labels_total: usize,
    /// Frames the decoder released (written + failed + dropped).
    pub frames_decoded: u64,
    /// Frames written as images.
    pub frames_written: u64,
    /// Frames that consumed a label but could not be converted, encoded, or
    /// written.
    pub frames_failed: u64,
    /// Frames discarded because no label was left for them. Packets after
    /// the labels run out are not decoded, so this is not a count of the
    /// remaining frames in the video.
    pub frames_dropped: u64,
    /// Packets the decoder refused.
    pub packets_skipped: u64,
    /// Hard decoder errors seen while draining.
    pub decode_errors: u64,
    /// Container read error that ended the packet loop before end-of-file.
    pub read_error: Option<String>,
}

impl ExtractionReport {
    fn new(stream: StreamInfo, labels_total: usize) -> Self {
        Self {
            stream,
            labels_total,
            frames_decoded: 0,
            frames_written: 0,
            frames_failed: 0,
            frames_dropped: 0,
            packets_skipped: 0,
            decode_errors: 0,
            read_error: None,
        }
    }

    fn absorb(&mut self, outcome: DrainOutcome) {
        self.frames_decoded += outcome.received();
        self.frames_written += outcome.written;
        self.frames_failed += outcome.failed;
        self.frames_dropped += outcome.dropped;
        if outcome.decode_error.is_some() {
            self.decode_errors += 1;
        }
    }

    /// `true` if every labelled frame was written, the decoder never
    /// reported a hard error, and the container was read to the end. Dropped
    /// frames and skipped packets do not count against success.
    pub fn is_success(&self) -> bool {
        self.frames_failed == 0 && self.decode_errors == 0 && self.read_error.is_none()
    }
}

/// Result of reading one packet from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketStatus {
    /// A packet was read.
    Read,
    /// End of file.
    End,
    /// Any other read error. Reading stops; retrying could loop forever on a
    /// persistent I/O error.
    Failed(String),
}

impl PacketStatus {
    pub fn from_read(result: Result<(), FfmpegError>) -> Self {
        match result {
            Ok(()) => PacketStatus::Read,
            Err(FfmpegError::Eof) => PacketStatus::End,
            Err(error) => PacketStatus::Failed(error.to_string()),
        }
    }
}

/// Frames coming out of an FFmpeg video decoder.
struct DecoderFrames<'a>(&'a mut VideoDecoder);

impl FrameSource for DecoderFrames<'_> {
    type Frame = VideoFrame;

    fn pull_frame(&mut self, frame: &mut VideoFrame) -> FrameStatus {
        match self.0.receive_frame(frame) {
            Ok(()) => FrameStatus::Ready,
            Err(FfmpegError::Other { errno }) if errno == EAGAIN => FrameStatus::Empty,
            Err(FfmpegError::Eof) => FrameStatus::Empty,
            Err(error) => FrameStatus::Failed(error.to_string()),
        }
    }
}

/// Normalizes, encodes, and writes decoded frames.
struct JpegSink {
    normalizer: PixelNormalizer,
    encoder: FrameEncoder,
    progress: ProgressTracker,
}

impl JpegSink {
    fn save(&mut self, frame: &mut VideoFrame, destination: &Path) -> Result<(), ExtractError> {
        let mut normalized = self.normalizer.normalize(frame)?;
        self.encoder
            .encode_to_file(normalized.frame_mut(), destination)?;
        Ok(())
    }
}

impl FrameSink<VideoFrame> for JpegSink {
    fn write_frame(
        &mut self,
        frame: &mut VideoFrame,
        label: &str,
        destination: &Path,
    ) -> Result<(), ExtractError> {
        let result = self.save(frame, destination);
        self.progress.advance(label, result.is_ok());
        result
    }
}

impl VideoSource {
    /// Decode every frame and write one JPEG per label into `output_dir`.
    ///
    /// Consumes the source; the container, decoder, and converter are all
    /// released before this returns. `output_dir` must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::DecoderOpen`] if the decoder cannot be opened.
    /// Failures after that point are recorded in the report instead.
    pub fn extract<P: AsRef<Path>>(
        mut self,
        labels: &FrameLabels,
        output_dir: P,
        options: &ExtractOptions,
    ) -> Result<ExtractionReport, ExtractError> {
        let output_dir = output_dir.as_ref();
        let stream = self.stream.clone();
        let mut decoder = self.open_decoder()?;

        log::info!(
            "Extracting {} ({stream}) into {} with {} labels",
            self.path().display(),
            output_dir.display(),
            labels.len(),
        );

        let mut sink = JpegSink {
            normalizer: PixelNormalizer::new(stream.width, stream.height),
            encoder: FrameEncoder::new(options.quality),
            progress: ProgressTracker::new(options.progress.clone(), labels.len()),
        };
        let mut cursor = labels.cursor();
        let mut report = ExtractionReport::new(stream.clone(), labels.len());
        let mut frame = VideoFrame::empty();

        loop {
            if cursor.is_exhausted() {
                log::debug!(
                    "All {} labels used; not reading the rest of {}",
                    labels.len(),
                    self.path().display(),
                );
                break;
            }

            let mut packet = Packet::empty();
            match PacketStatus::from_read(packet.read(&mut self.input)) {
                PacketStatus::Read => {}
                PacketStatus::End => break,
                PacketStatus::Failed(reason) => {
                    log::warn!("Stopped reading {}: {reason}", self.path().display());
                    report.read_error = Some(reason);
                    break;
                }
            }
            if packet.stream() != stream.index {
                continue;
            }

            if let Err(error) = decoder.send_packet(&packet) {
                log::warn!("Skipping packet at pts {:?}: {error}", packet.pts());
                report.packets_skipped += 1;
                continue;
            }

            let outcome = drain_frames(
                &mut DecoderFrames(&mut decoder),
                &mut frame,
                &mut cursor,
                &mut sink,
                output_dir,
            );
            report.absorb(outcome);
        }

        if let Err(error) = decoder.send_eof() {
            log::warn!("Failed to signal end of stream to the decoder: {error}");
        }
        let outcome = drain_frames(
            &mut DecoderFrames(&mut decoder),
            &mut frame,
            &mut cursor,
            &mut sink,
            output_dir,
        );
        if outcome.received() > 0 {
            log::debug!("Flush released {} buffered frames", outcome.received());
        }
        report.absorb(outcome);

        if sink.normalizer.has_scaler() {
            log::debug!("Converted frames from {}", stream.pixel_format_name());
        }
        log::info!(
            "Finished {}: {} written, {} failed, {} dropped, {} packets skipped",
            self.path().display(),
            report.frames_written,
            report.frames_failed,
            report.frames_dropped,
            report.packets_skipped,
        );

        Ok(report)
    }
}
