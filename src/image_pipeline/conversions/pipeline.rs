use std::io::Write;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::image_pipeline::{
    color::{ColorStage, ColorTransform, Transfer},
    common::{ConversionError, PipelineTimings, Result},
    container::{self, ContainerKind, ImageReader, ImageWriter, ScanlineSource},
    conversions::ConversionConfig,
    decode::decode_raster,
    layout::{EncodedImage, encode_pixels},
    raster::SampleFormat,
};

pub struct ConversionPipeline<R: ImageReader, W: ImageWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
}

impl ConversionPipeline<Box<dyn ImageReader>, Box<dyn ImageWriter>> {
    pub fn for_containers(
        source: ContainerKind,
        destination: ContainerKind,
        config: ConversionConfig,
    ) -> Self {
        Self {
            reader: container::reader_for(source),
            writer: container::writer_for(destination),
            config,
        }
    }
}

impl<R: ImageReader, W: ImageWriter> ConversionPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                warn!("Image dimensions {}x{} exceed maximum {}", width, height, max);
                return Err(ConversionError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    /// Transform that linearizes samples stored in `source`.
    fn input_stage(&self, source: &SampleFormat) -> ColorStage {
        let transfer = self.config.source_transfer.unwrap_or(if source.is_integer() {
            self.config.output_transfer()
        } else {
            Transfer::Linear
        });
        ColorStage::new(ColorTransform::decoding(transfer))
    }

    /// Exposure plus the encoding expected by `target`. Integer targets are
    /// clipped to [0, 1] before encoding.
    fn output_stage(&self, target: &SampleFormat) -> ColorStage {
        let transform = if target.is_integer() {
            ColorTransform::encoding(self.config.output_transfer())
        } else {
            ColorTransform::Identity
        };
        ColorStage::new(transform)
            .with_exposure(self.config.exposure_stops)
            .clamped(target.is_integer())
    }

    /// Runs every stage up to, but not including, the container write.
    pub fn encode(&self, input_data: &[u8], timings: &mut PipelineTimings) -> Result<EncodedImage> {
        let scanlines = timings.time("read_container", || {
            let container = self.reader.container();
            let _span = tracing::info_span!("read_container", %container).entered();
            self.reader.read_image(input_data)
        })?;

        let (width, height) = scanlines.dimensions();
        {
            let _span = tracing::info_span!("validate_dimensions", width, height).entered();
            self.validate_dimensions(width, height)?;
        }

        let source = scanlines.sample_format();
        let target = self.writer.target_format(&source, &self.config)?;
        info!(%source, %target, "Resolved sample formats");

        let mut raster = timings.time("decode_samples", || {
            let _span = tracing::info_span!("decode_samples").entered();
            decode_raster(&scanlines)
        })?;
        drop(scanlines);

        let input_stage = self.input_stage(&source);
        let output_stage = self.output_stage(&target);
        timings.time("color_transform", || {
            let _span = tracing::info_span!("color_transform").entered();
            input_stage.apply(&mut raster);
            output_stage.apply(&mut raster);
        });

        timings.time("map_channels", || {
            let _span = tracing::info_span!("map_channels").entered();
            encode_pixels(&raster, &target, self.config.alpha_policy())
        })
    }

    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert_with_timings(
        &self,
        input_data: &[u8],
        output: &mut dyn Write,
    ) -> Result<PipelineTimings> {
        let mut timings = PipelineTimings::new();
        info!(
            "Starting {} to {} conversion",
            self.reader.container(),
            self.writer.container()
        );

        let encoded = self.encode(input_data, &mut timings)?;

        timings.time("write_container", || {
            let container = self.writer.container();
            let _span = tracing::info_span!("write_container", %container).entered();
            self.writer.write_image(&encoded, output, &self.config)
        })?;

        info!(
            width = encoded.width,
            height = encoded.height,
            elapsed_ms = timings.total_duration().as_secs_f64() * 1000.0,
            "Conversion complete"
        );
        Ok(timings)
    }

    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<()> {
        self.convert_with_timings(input_data, output).map(|_| ())
    }

    /// Converts `input_path` into `output_path`. The output file is only
    /// created once the whole image has been encoded.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<PipelineTimings> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        let mut timings = PipelineTimings::new();
        let input_data = timings.time("read_input_file", || read_input(input_path))?;

        let mut encoded = Vec::new();
        timings.append(self.convert_with_timings(&input_data, &mut encoded)?);

        timings.time("write_output_file", || write_output(output_path, &encoded))?;
        Ok(timings)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let _span = tracing::info_span!("read_input_file").entered();
    std::fs::read(path)
        .map_err(|e| ConversionError::InputReadError(format!("{}: {}", path.display(), e)))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let _span = tracing::info_span!("write_output_file", bytes = bytes.len()).entered();
    std::fs::write(path, bytes).map_err(|e| {
        // Never leave a truncated file behind.
        let _ = std::fs::remove_file(path);
        ConversionError::OutputWriteError(format!("{}: {}", path.display(), e))
    })
}

/// Converts between files, picking containers from the input's magic bytes
/// and the output's extension.
#[instrument(skip(input_path, output_path, config))]
pub fn convert_path<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    config: &ConversionConfig,
) -> Result<PipelineTimings> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "Converting file"
    );

    let destination = ContainerKind::for_output(output_path)?;

    let mut timings = PipelineTimings::new();
    let input_data = timings.time("read_input_file", || read_input(input_path))?;
    let source = ContainerKind::detect(input_path, &input_data)?;

    let pipeline = ConversionPipeline::for_containers(source, destination, config.clone());
    let mut encoded = Vec::new();
    timings.append(pipeline.convert_with_timings(&input_data, &mut encoded)?);

    timings.time("write_output_file", || write_output(output_path, &encoded))?;
    Ok(timings)
}
