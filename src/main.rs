use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use rastconv_rs::image_pipeline::{
    ConversionConfig, ExrCompression, OutputDepth, TiffCompression, Transfer, convert_path,
};
use rastconv_rs::logger;

use tracing::{error, info};

#[derive(Parser)]
#[command(name = "rastconv")]
#[command(author, version, about = "Convert raster images between TIFF, OpenEXR and PNG")]
#[command(long_about = "
Convert raster images between TIFF, OpenEXR and PNG.

Integer sources are treated as sRGB-encoded and linearized; float sources are
linear. Integer destinations are sRGB (or --gamma) encoded.

Examples:
  rastconv -i scan.tif -o scan.exr
  rastconv -i render.exr -o preview.png -e 1.5
  rastconv -i render.exr -o preview.png -g 2.2 -a
  rastconv -i plate.png -o plate.tif -d 16 -c deflate
")]
struct Cli {
    /// Input file (container detected from its contents)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (container chosen by extension: tif, tiff, exr, png)
    #[arg(short, long)]
    output: PathBuf,

    /// Write alpha = 1.0 regardless of the source
    #[arg(short = 'a', long)]
    ignore_alpha: bool,

    /// Use a plain power-law gamma instead of sRGB for integer samples
    #[arg(short, long, value_parser = parse_gamma)]
    gamma: Option<f32>,

    /// Exposure adjustment in stops, applied before encoding
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    exposure: f32,

    /// Treat integer sources as linear light
    #[arg(long)]
    linear_input: bool,

    /// Output sample type (defaults depend on the destination container)
    #[arg(short, long, value_enum)]
    depth: Option<DepthArg>,

    /// Output channel count: 1, 3 or 4
    #[arg(long, value_parser = parse_channels)]
    channels: Option<usize>,

    /// Compression for the destination container
    #[arg(short, long, value_enum)]
    compression: Option<CompressionArg>,

    /// Print a per-stage timing summary
    #[arg(long)]
    timings: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DepthArg {
    #[value(name = "8")]
    U8,
    #[value(name = "16")]
    U16,
    #[value(name = "half")]
    Half,
    #[value(name = "32", alias = "float")]
    Float,
}

impl From<DepthArg> for OutputDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::U8 => OutputDepth::U8,
            DepthArg::U16 => OutputDepth::U16,
            DepthArg::Half => OutputDepth::F16,
            DepthArg::Float => OutputDepth::F32,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    Deflate,
    DeflateFast,
    DeflateBest,
    Zip,
    Rle,
    Piz,
}

impl CompressionArg {
    /// TIFF and EXR settings selected by this name. Names that only make sense
    /// for one container leave the other at its default.
    fn settings(self) -> (Option<TiffCompression>, Option<ExrCompression>) {
        match self {
            CompressionArg::None => (Some(TiffCompression::None), Some(ExrCompression::None)),
            CompressionArg::Lzw => (Some(TiffCompression::Lzw), None),
            CompressionArg::Deflate | CompressionArg::Zip => {
                (Some(TiffCompression::DeflateBalanced), Some(ExrCompression::Zip))
            }
            CompressionArg::DeflateFast => (Some(TiffCompression::DeflateFast), None),
            CompressionArg::DeflateBest => (Some(TiffCompression::DeflateBest), None),
            CompressionArg::Rle => (None, Some(ExrCompression::Rle)),
            CompressionArg::Piz => (None, Some(ExrCompression::Piz)),
        }
    }
}

fn parse_gamma(s: &str) -> std::result::Result<f32, String> {
    let gamma: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if gamma.is_finite() && gamma > 0.0 {
        Ok(gamma)
    } else {
        Err(format!("gamma must be a positive number, got {s}"))
    }
}

fn parse_channels(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n @ (1 | 3 | 4)) => Ok(n),
        _ => Err(format!("channels must be 1, 3 or 4, got {s}")),
    }
}

fn build_config(cli: &Cli) -> ConversionConfig {
    let mut builder = ConversionConfig::builder()
        .ignore_alpha(cli.ignore_alpha)
        .gamma(cli.gamma)
        .exposure(cli.exposure)
        .output_depth(cli.depth.map(OutputDepth::from))
        .output_channels(cli.channels);

    if cli.linear_input {
        builder = builder.source_transfer(Some(Transfer::Linear));
    }

    if let Some(compression) = cli.compression {
        let (tiff, exr) = compression.settings();
        if let Some(tiff) = tiff {
            builder = builder.tiff_compression(tiff);
        }
        if let Some(exr) = exr {
            builder = builder.exr_compression(exr);
        }
    }

    builder.build()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let config = build_config(&cli);
    info!(
        "Converting {} -> {}",
        cli.input.display(),
        cli.output.display()
    );

    let timings = convert_path(&cli.input, &cli.output, &config)
        .inspect_err(|e| error!(stage = %e.stage(), "Conversion failed: {}", e))
        .with_context(|| {
            format!(
                "Failed to convert {} to {}",
                cli.input.display(),
                cli.output.display()
            )
        })?;

    if cli.timings {
        println!("{}", timings.summary());
    }

    info!("Conversion successful");
    Ok(())
}
