use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use half::f16;

use crate::image_pipeline::color::Transfer;
use crate::image_pipeline::common::{ConversionError, Result, Stage};
use crate::image_pipeline::container::{
    ContainerKind, ExrCompression, ExrReader, ImageReader, ImageWriter, PngReader, PngWriter,
    ScanlineImage, ScanlineSource, TiffCompression, TiffReader,
};
use crate::image_pipeline::conversions::{
    ConversionConfig, ConversionPipeline, OutputDepth, convert_path,
};
use crate::image_pipeline::layout::{EncodedImage, PixelData};
use crate::image_pipeline::raster::{PlanarLayout, SampleFormat, SampleKind};

struct MockReader {
    should_fail: bool,
    mock_image: Option<ScanlineImage>,
}

impl ImageReader for MockReader {
    fn container(&self) -> ContainerKind {
        ContainerKind::Tiff
    }

    fn read_image(&self, _data: &[u8]) -> Result<ScanlineImage> {
        if self.should_fail {
            return Err(ConversionError::DecodeError {
                container: "mock",
                reason: "Mock decode error".to_string(),
            });
        }
        Ok(self.mock_image.clone().unwrap_or_else(|| {
            let format = SampleFormat::contiguous(SampleKind::Unsigned, 8, 3);
            ScanlineImage::new(4, 4, format, vec![vec![0u8; 4 * 4 * 3]])
        }))
    }
}

struct MockWriter {
    should_fail: bool,
    target: SampleFormat,
    written_data: Arc<Mutex<Vec<EncodedImage>>>,
}

impl MockWriter {
    fn rgba8(written_data: Arc<Mutex<Vec<EncodedImage>>>) -> Self {
        Self {
            should_fail: false,
            target: SampleFormat::contiguous(SampleKind::Unsigned, 8, 4),
            written_data,
        }
    }
}

impl ImageWriter for MockWriter {
    fn container(&self) -> ContainerKind {
        ContainerKind::Png
    }

    fn target_format(
        &self,
        _source: &SampleFormat,
        config: &ConversionConfig,
    ) -> Result<SampleFormat> {
        let mut target = self.target;
        if let Some(channels) = config.output_channels {
            target.samples_per_pixel = channels;
        }
        Ok(target)
    }

    fn write_image(
        &self,
        image: &EncodedImage,
        _output: &mut dyn Write,
        _config: &ConversionConfig,
    ) -> Result<()> {
        if self.should_fail {
            return Err(ConversionError::EncodeError {
                container: "mock",
                reason: "Mock encode error".to_string(),
            });
        }
        self.written_data.lock().unwrap().push(image.clone());
        Ok(())
    }
}

fn rgba8_image(width: usize, height: usize, pixel: [u8; 4]) -> ScanlineImage {
    let format = SampleFormat::contiguous(SampleKind::Unsigned, 8, 4);
    ScanlineImage::new(width, height, format, vec![pixel.repeat(width * height)])
}

fn run(image: ScanlineImage, config: ConversionConfig) -> Result<EncodedImage> {
    let written = Arc::new(Mutex::new(Vec::new()));
    let reader = MockReader {
        should_fail: false,
        mock_image: Some(image),
    };
    let writer = MockWriter::rgba8(written.clone());
    let pipeline = ConversionPipeline::with_custom(reader, writer, config);

    let mut output = Cursor::new(Vec::new());
    pipeline.convert(b"fake image data", &mut output)?;

    let mut written = written.lock().unwrap();
    assert_eq!(written.len(), 1);
    Ok(written.remove(0))
}

fn u8_samples(image: &EncodedImage) -> &[u8] {
    match &image.data {
        PixelData::U8(d) => d.as_slice(),
        other => panic!("expected 8-bit samples, got {:?}", other),
    }
}

#[test]
fn test_config_builder() {
    let config = ConversionConfig::builder()
        .ignore_alpha(true)
        .gamma(Some(2.2))
        .exposure(-1.5)
        .source_transfer(Some(Transfer::Linear))
        .output_depth(Some(OutputDepth::F32))
        .output_channels(Some(3))
        .tiff_compression(TiffCompression::DeflateBest)
        .predictor(Some(2))
        .exr_compression(ExrCompression::Piz)
        .validate_dimensions(false)
        .max_dimension(Some(10000))
        .build();

    assert!(config.ignore_alpha);
    assert_eq!(config.gamma, Some(2.2));
    assert_eq!(config.exposure_stops, -1.5);
    assert_eq!(config.source_transfer, Some(Transfer::Linear));
    assert_eq!(config.output_depth, Some(OutputDepth::F32));
    assert_eq!(config.output_channels, Some(3));
    assert_eq!(config.tiff_compression, TiffCompression::DeflateBest);
    assert_eq!(config.predictor, Some(2));
    assert_eq!(config.exr_compression, ExrCompression::Piz);
    assert!(!config.validate_dimensions);
    assert_eq!(config.max_dimension, Some(10000));
    assert_eq!(config.output_transfer(), Transfer::Gamma(2.2));
}

#[test]
fn test_config_defaults() {
    let config = ConversionConfig::builder().build();
    assert!(!config.ignore_alpha);
    assert_eq!(config.gamma, None);
    assert_eq!(config.exposure_stops, 0.0);
    assert_eq!(config.tiff_compression, TiffCompression::Lzw);
    assert_eq!(config.exr_compression, ExrCompression::Zip);
    assert!(config.validate_dimensions);
    assert_eq!(config.output_transfer(), Transfer::Srgb);
}

#[test]
fn test_successful_conversion() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let reader = MockReader {
        should_fail: false,
        mock_image: None,
    };
    let writer = MockWriter::rgba8(written.clone());

    let pipeline = ConversionPipeline::with_custom(reader, writer, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let timings = pipeline.convert_with_timings(b"fake image data", &mut output).unwrap();

    assert_eq!(written.lock().unwrap().len(), 1);
    let stages = [
        "read_container",
        "decode_samples",
        "color_transform",
        "map_channels",
        "write_container",
    ];
    for stage in stages {
        assert!(timings.get(stage).is_some(), "missing timing for {stage}");
    }
}

#[test]
fn test_reader_failure() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let reader = MockReader {
        should_fail: true,
        mock_image: None,
    };
    let writer = MockWriter::rgba8(written.clone());
    let pipeline = ConversionPipeline::with_custom(reader, writer, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake image data", &mut output);

    assert!(matches!(result.unwrap_err(), ConversionError::DecodeError { .. }));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_writer_failure() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let reader = MockReader {
        should_fail: false,
        mock_image: None,
    };
    let writer = MockWriter {
        should_fail: true,
        ..MockWriter::rgba8(written)
    };
    let pipeline = ConversionPipeline::with_custom(reader, writer, ConversionConfig::default());

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(b"fake image data", &mut output);

    assert!(matches!(result.unwrap_err(), ConversionError::EncodeError { .. }));
}

#[test]
fn test_dimension_validation_failure() {
    let config = ConversionConfig::builder().max_dimension(Some(8)).build();
    let result = run(rgba8_image(16, 4, [0, 0, 0, 255]), config);
    assert!(matches!(result, Err(ConversionError::InvalidDimensions(16, 4))));
}

#[test]
fn test_dimension_validation_disabled() {
    let config = ConversionConfig::builder()
        .max_dimension(Some(8))
        .validate_dimensions(false)
        .build();
    let image = run(rgba8_image(16, 4, [0, 0, 0, 255]), config).unwrap();
    assert_eq!((image.width, image.height), (16, 4));
}

#[test]
fn test_set_config() {
    let reader = MockReader {
        should_fail: false,
        mock_image: Some(rgba8_image(16, 16, [0, 0, 0, 255])),
    };
    let written = Arc::new(Mutex::new(Vec::new()));
    let writer = MockWriter::rgba8(written);
    let mut pipeline = ConversionPipeline::with_custom(reader, writer, ConversionConfig::default());

    pipeline.set_config(ConversionConfig::builder().max_dimension(Some(4)).build());
    assert_eq!(pipeline.config().max_dimension, Some(4));

    let mut output = Vec::new();
    assert!(pipeline.convert(b"", &mut output).is_err());
}

#[test]
fn test_mid_grey_survives_srgb_round_trip() {
    let format = SampleFormat::contiguous(SampleKind::Unsigned, 8, 3);
    let image = ScanlineImage::new(2, 1, format, vec![vec![128u8; 6]]);

    let encoded = run(image, ConversionConfig::default()).unwrap();
    let samples = u8_samples(&encoded);
    assert_eq!(samples.len(), 8);
    for px in samples.chunks(4) {
        for &v in &px[..3] {
            assert!((127..=129).contains(&v), "got {v}");
        }
        assert_eq!(px[3], 255);
    }
}

#[test]
fn test_source_alpha_is_preserved() {
    // 51 / 255 == 0.2
    let encoded = run(rgba8_image(2, 2, [10, 20, 30, 51]), ConversionConfig::default()).unwrap();
    assert!(u8_samples(&encoded).chunks(4).all(|px| px[3] == 51));
}

#[test]
fn test_ignore_alpha_writes_opaque() {
    let config = ConversionConfig::builder().ignore_alpha(true).build();
    let encoded = run(rgba8_image(2, 2, [10, 20, 30, 51]), config).unwrap();
    assert!(u8_samples(&encoded).chunks(4).all(|px| px[3] == 255));
}

#[test]
fn test_mono_broadcasts_to_rgba() {
    let format = SampleFormat::contiguous(SampleKind::Unsigned, 8, 1);
    let image = ScanlineImage::new(3, 1, format, vec![vec![0, 200, 255]]);

    let encoded = run(image, ConversionConfig::default()).unwrap();
    let samples = u8_samples(&encoded);
    assert_eq!(samples.len(), 12);
    for (px, expected) in samples.chunks(4).zip([0u8, 200, 255]) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert!(px[0].abs_diff(expected) <= 1);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn test_color_to_mono_is_a_channel_mismatch() {
    let config = ConversionConfig::builder().output_channels(Some(1)).build();
    let result = run(rgba8_image(1, 1, [1, 2, 3, 4]), config);
    assert!(matches!(
        result,
        Err(ConversionError::ChannelCountMismatch {
            source_channels: 4,
            target_channels: 1
        })
    ));
}

#[test]
fn test_exposure_applies_before_encoding() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let source = SampleFormat::contiguous(SampleKind::Float, 32, 1);
    let bytes: Vec<u8> = [0.25f32, 0.5].iter().flat_map(|v| v.to_le_bytes()).collect();
    let reader = MockReader {
        should_fail: false,
        mock_image: Some(ScanlineImage::new(2, 1, source, vec![bytes])),
    };
    let writer = MockWriter {
        target: SampleFormat::contiguous(SampleKind::Float, 32, 3),
        ..MockWriter::rgba8(written.clone())
    };
    let config = ConversionConfig::builder().exposure(1.0).build();
    let pipeline = ConversionPipeline::with_custom(reader, writer, config);

    let mut output = Vec::new();
    pipeline.convert(b"", &mut output).unwrap();

    let written = written.lock().unwrap();
    let PixelData::F32(samples) = &written[0].data else {
        panic!("expected float output");
    };
    // Float destinations are linear and unclamped.
    assert_eq!(samples, &vec![0.5, 0.5, 0.5, 1.0, 1.0, 1.0]);
}

#[test]
fn test_linear_source_override() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let format = SampleFormat::contiguous(SampleKind::Unsigned, 8, 1);
    let reader = MockReader {
        should_fail: false,
        mock_image: Some(ScanlineImage::new(1, 1, format, vec![vec![51]])),
    };
    let writer = MockWriter {
        target: SampleFormat::contiguous(SampleKind::Float, 32, 1),
        ..MockWriter::rgba8(written.clone())
    };
    let config = ConversionConfig::builder()
        .source_transfer(Some(Transfer::Linear))
        .build();
    let pipeline = ConversionPipeline::with_custom(reader, writer, config);

    let mut output = Vec::new();
    pipeline.convert(b"", &mut output).unwrap();

    let written = written.lock().unwrap();
    let PixelData::F32(samples) = &written[0].data else {
        panic!("expected float output");
    };
    assert_abs_diff_eq!(samples[0], 0.2, epsilon = 1e-6);
}

#[test]
fn test_twelve_bit_source_leaves_no_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.tif");
    let output = dir.path().join("out.png");
    std::fs::write(&input, b"fake image data").unwrap();

    let format = SampleFormat::new(SampleKind::Unsigned, 12, 3, PlanarLayout::Contiguous);
    let reader = MockReader {
        should_fail: false,
        mock_image: Some(ScanlineImage::new(2, 2, format, vec![vec![0u8; 24]])),
    };
    let written = Arc::new(Mutex::new(Vec::new()));
    let writer = MockWriter::rgba8(written);
    let pipeline = ConversionPipeline::with_custom(reader, writer, ConversionConfig::default());

    let result = pipeline.convert_file(&input, &output);
    assert!(matches!(
        result,
        Err(ConversionError::FormatUnsupported {
            stage: Stage::Decode,
            ..
        })
    ));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = convert_path(
        dir.path().join("missing.png"),
        dir.path().join("out.tif"),
        &ConversionConfig::default(),
    );
    assert!(matches!(result, Err(ConversionError::InputReadError(_))));
}

#[test]
fn test_unknown_output_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.jpg");
    std::fs::write(&input, b"not read").unwrap();

    let result = convert_path(&input, &output, &ConversionConfig::default());
    assert!(matches!(result, Err(ConversionError::UnsupportedContainer(_))));
    assert!(!output.exists());
}

fn f16_at(scanline: &[u8], index: usize) -> f32 {
    f16::from_le_bytes([scanline[2 * index], scanline[2 * index + 1]]).to_f32()
}

#[test]
fn test_png_tiff_exr_png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let png_in = dir.path().join("grey.png");
    let tiff = dir.path().join("grey.tif");
    let exr = dir.path().join("grey.exr");
    let png_out = dir.path().join("grey_out.png");

    let source = EncodedImage {
        width: 2,
        height: 2,
        format: SampleFormat::contiguous(SampleKind::Unsigned, 8, 3),
        data: PixelData::U8(vec![128; 12]),
    };
    let mut bytes = Vec::new();
    PngWriter
        .write_image(&source, &mut bytes, &ConversionConfig::default())
        .unwrap();
    std::fs::write(&png_in, &bytes).unwrap();

    let config = ConversionConfig::default();

    let timings = convert_path(&png_in, &tiff, &config).unwrap();
    assert!(timings.get("write_output_file").is_some());
    let back = TiffReader.read_image(&std::fs::read(&tiff).unwrap()).unwrap();
    assert_eq!(back.format, SampleFormat::contiguous(SampleKind::Unsigned, 8, 3));
    assert!(back.read_scanline(1, 0).unwrap().iter().all(|v| v.abs_diff(128) <= 1));

    convert_path(&tiff, &exr, &config).unwrap();
    let back = ExrReader.read_image(&std::fs::read(&exr).unwrap()).unwrap();
    assert_eq!(back.format, SampleFormat::contiguous(SampleKind::Float, 16, 4));
    let row = back.read_scanline(0, 0).unwrap();
    // sRGB 128 is ~0.2159 in linear light.
    assert_abs_diff_eq!(f16_at(row, 0), 0.2159, epsilon = 1e-3);
    assert_abs_diff_eq!(f16_at(row, 3), 1.0, epsilon = 1e-6);

    convert_path(&exr, &png_out, &config).unwrap();
    let back = PngReader.read_image(&std::fs::read(&png_out).unwrap()).unwrap();
    assert_eq!(back.format, SampleFormat::contiguous(SampleKind::Unsigned, 8, 4));
    for px in back.read_scanline(1, 0).unwrap().chunks(4) {
        assert!(px[..3].iter().all(|v| v.abs_diff(128) <= 1));
        assert_eq!(px[3], 255);
    }
}
