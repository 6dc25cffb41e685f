//! Pixel format normalization tests on synthetic frames.

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame, util::color::Range as ColorRange};
use stillframes::{ENCODER_PIXEL_FORMAT, ExtractError, FrameEncoder, PixelNormalizer};

const WIDTH: u32 = 32;
const HEIGHT: u32 = 24;

fn filled_frame(format: Pixel, width: u32, height: u32) -> VideoFrame {
    ffmpeg_next::init().expect("Failed to initialize FFmpeg");
    let mut frame = VideoFrame::new(format, width, height);
    for plane in 0..frame.planes() {
        frame.data_mut(plane).fill(128);
    }
    frame.set_pts(Some(42));
    frame
}

#[test]
fn encoder_format_passes_through() {
    let mut frame = filled_frame(ENCODER_PIXEL_FORMAT, WIDTH, HEIGHT);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);

    let normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");
    assert!(!normalized.is_converted());
    assert_eq!(normalized.frame().format(), ENCODER_PIXEL_FORMAT);
    drop(normalized);
    assert!(!normalizer.has_scaler(), "passthrough must not build a converter");
}

#[test]
fn rgb_frame_is_converted() {
    let mut frame = filled_frame(Pixel::RGB24, WIDTH, HEIGHT);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);

    let normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");
    assert!(normalized.is_converted());
    let converted = normalized.frame();
    assert_eq!(converted.format(), ENCODER_PIXEL_FORMAT);
    assert_eq!((converted.width(), converted.height()), (WIDTH, HEIGHT));
    assert_eq!(converted.pts(), Some(42));
}

#[test]
fn limited_range_yuv_is_converted() {
    assert!(PixelNormalizer::needs_conversion(Pixel::YUV420P, ColorRange::MPEG));
    assert!(PixelNormalizer::needs_conversion(Pixel::YUV420P, ColorRange::Unspecified));
    assert!(!PixelNormalizer::needs_conversion(ENCODER_PIXEL_FORMAT, ColorRange::JPEG));

    let mut frame = filled_frame(Pixel::YUV420P, WIDTH, HEIGHT);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);
    let normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");
    assert_eq!(normalized.frame().format(), ENCODER_PIXEL_FORMAT);
}

#[test]
fn converter_is_built_once_and_reused() {
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);
    assert!(!normalizer.has_scaler());

    for _ in 0..3 {
        let mut frame = filled_frame(Pixel::YUV420P, WIDTH, HEIGHT);
        normalizer.normalize(&mut frame).expect("Failed to normalize");
        assert!(normalizer.has_scaler());
    }
}

#[test]
fn mismatched_dimensions_are_rejected() {
    let mut frame = filled_frame(Pixel::RGB24, WIDTH * 2, HEIGHT);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);

    let error = normalizer.normalize(&mut frame).unwrap_err();
    assert!(
        matches!(error, ExtractError::Conversion(_)),
        "Expected Conversion, got: {error:?}"
    );
}

#[test]
fn converted_frame_encodes() {
    let mut frame = filled_frame(Pixel::YUV420P, WIDTH, HEIGHT);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);
    let mut normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");

    let jpeg = FrameEncoder::new(80)
        .encode(normalized.frame_mut())
        .expect("Failed to encode converted frame");
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

/// Top half of the luma plane black (0), bottom half white (255).
fn black_and_white_frame(format: Pixel, range: ColorRange) -> VideoFrame {
    let mut frame = filled_frame(format, WIDTH, HEIGHT);
    frame.set_color_range(range);
    let stride = frame.stride(0);
    let luma = frame.data_mut(0);
    for y in 0..HEIGHT as usize {
        let value = if y < HEIGHT as usize / 2 { 0 } else { 255 };
        luma[y * stride..y * stride + WIDTH as usize].fill(value);
    }
    frame
}

fn luma_at(frame: &VideoFrame, x: usize, y: usize) -> u8 {
    frame.data(0)[y * frame.stride(0) + x]
}

#[test]
fn full_range_yuv420p_is_retagged_without_touching_pixels() {
    assert!(!PixelNormalizer::needs_conversion(Pixel::YUV420P, ColorRange::JPEG));

    let mut frame = black_and_white_frame(Pixel::YUV420P, ColorRange::JPEG);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);
    let normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");

    assert!(!normalized.is_converted());
    let output = normalized.frame();
    assert_eq!(output.format(), ENCODER_PIXEL_FORMAT);
    assert_eq!(luma_at(output, 3, 2), 0);
    assert_eq!(luma_at(output, 3, HEIGHT as usize - 2), 255);
    drop(normalized);
    assert!(!normalizer.has_scaler());
}

#[test]
fn full_range_input_keeps_its_extremes_through_conversion() {
    let mut frame = black_and_white_frame(Pixel::YUV444P, ColorRange::JPEG);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);
    let normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");

    assert!(normalized.is_converted());
    let output = normalized.frame();
    assert!(luma_at(output, 3, 2) <= 1, "black became {}", luma_at(output, 3, 2));
    let white = luma_at(output, 3, HEIGHT as usize - 2);
    assert!(white >= 254, "white became {white}");
}

#[test]
fn limited_range_input_is_expanded() {
    let mut frame = filled_frame(Pixel::YUV420P, WIDTH, HEIGHT);
    frame.set_color_range(ColorRange::MPEG);
    frame.data_mut(0).fill(235);
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);
    let normalized = normalizer.normalize(&mut frame).expect("Failed to normalize");

    let white = luma_at(normalized.frame(), 3, 3);
    assert!(white >= 253, "limited-range white became {white}");
}

#[test]
fn converter_follows_range_changes_between_frames() {
    let mut normalizer = PixelNormalizer::new(WIDTH, HEIGHT);

    let mut limited = black_and_white_frame(Pixel::YUV444P, ColorRange::MPEG);
    limited.data_mut(0).fill(235);
    let white = luma_at(normalizer.normalize(&mut limited).unwrap().frame(), 3, 3);
    assert!(white >= 253, "limited-range white became {white}");

    let mut full = black_and_white_frame(Pixel::YUV444P, ColorRange::JPEG);
    full.data_mut(0).fill(128);
    let mid = luma_at(normalizer.normalize(&mut full).unwrap().frame(), 3, 3);
    assert!((127..=129).contains(&mid), "full-range mid-grey became {mid}");
}
