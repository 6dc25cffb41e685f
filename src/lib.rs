//! # stillframes
//!
//! Decode every frame of a video and save each one as a JPEG named by an
//! externally supplied label list, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! The *i*-th non-blank line of the label file names the *i*-th frame the
//! decoder releases. Frames that arrive after the labels run out are decoded
//! and discarded; labels left over when the video ends are simply unused.
//!
//! ## Quick Start
//!
//! ### One video
//!
//! ```no_run
//! use stillframes::{ExtractOptions, FrameLabels, VideoSource};
//!
//! let labels = FrameLabels::read("front.txt")?;
//! let report = VideoSource::open("front.mp4")?
//!     .extract(&labels, "images/front", &ExtractOptions::new().with_quality(95))?;
//! assert!(report.is_success());
//! # Ok::<(), stillframes::ExtractError>(())
//! ```
//!
//! ### A batch
//!
//! ```no_run
//! use stillframes::{BatchConfig, ExtractOptions, run_batch};
//!
//! let batch = BatchConfig::from_prefixes("video", "images", ["front", "rear"]);
//! let report = run_batch(&batch, &ExtractOptions::new());
//! println!("all jobs succeeded: {}", report.is_success());
//! ```
//!
//! ## Pipeline
//!
//! container → decoded frame → normalized frame (full-range YUV 4:2:0) →
//! JPEG bytes → `<output_dir>/<label>.jpg`
//!
//! Everything runs on the calling thread. Each job owns its container,
//! decoder, and converter and releases them before returning.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
pub mod configuration;
pub mod decode;
pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod labels;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod source;

pub use batch::{BatchReport, JobOutcome, check_job, run_batch, run_job};
pub use configuration::{BatchConfig, ExtractOptions, Job, MAX_QUALITY, MIN_QUALITY};
pub use decode::{
    DrainOutcome, FrameSink, FrameSource, FrameStatus, IMAGE_EXTENSION, drain_frames, image_path,
};
pub use encode::{FrameEncoder, quality_to_quantizer, write_payload};
pub use error::ExtractError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use labels::{FrameLabels, LabelCursor};
pub use metadata::StreamInfo;
pub use normalize::{
    ACCEPTED_PIXEL_FORMATS, ENCODER_PIXEL_FORMAT, NormalizedFrame, PixelNormalizer,
};
pub use pipeline::{ExtractionReport, PacketStatus};
pub use progress::{ProgressCallback, ProgressInfo};
pub use source::VideoSource;
