use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nitro_palette::{
    Algorithm, ColorNotation, DistanceMetric, ExtractionConfig, RawImage, extract,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// One JSON document per run: `[{ "file": ..., "palette": [...] }]`
    Json,
    /// `RRGGBB weight` per line
    Hex,
    /// `rgb(r,g,b) weight` per line
    Css,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    Euclidean,
    Perceptual,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    MedianCut,
    KMeans,
}

/// Extract representative color palettes from image files.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON file with extraction settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of palette colors (1-256)
    #[arg(short = 'k', long)]
    colors: Option<usize>,

    /// Sample every Nth pixel on both axes
    #[arg(short, long)]
    stride: Option<usize>,

    /// Distance metric used to merge near-duplicate colors
    #[arg(short, long, value_enum)]
    metric: Option<MetricArg>,

    /// Merge palette colors closer than this distance (0 disables)
    #[arg(long)]
    merge_threshold: Option<f64>,

    /// Quantization algorithm
    #[arg(short, long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    /// Skip near-white pixels
    #[arg(long, conflicts_with = "keep_white")]
    ignore_white: bool,

    /// Keep near-white pixels even if the config file skips them
    #[arg(long)]
    keep_white: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    palette: nitro_palette::ExtractionResult,
}

fn load_config(args: &Args) -> Result<ExtractionConfig> {
    let base = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ExtractionConfig::default(),
    };
    Ok(apply_overrides(args, &base))
}

fn apply_overrides(args: &Args, base: &ExtractionConfig) -> ExtractionConfig {
    let mut builder = base.to_builder();
    if let Some(k) = args.colors {
        builder = builder.palette_size(k);
    }
    if let Some(stride) = args.stride {
        builder = builder.sampling_stride(stride);
    }
    if let Some(metric) = args.metric {
        builder = builder.metric(match metric {
            MetricArg::Euclidean => DistanceMetric::Euclidean,
            MetricArg::Perceptual => DistanceMetric::Perceptual,
        });
    }
    if let Some(threshold) = args.merge_threshold {
        builder = builder.merge_threshold(threshold);
    }
    if let Some(algorithm) = args.algorithm {
        builder = builder.algorithm(match algorithm {
            AlgorithmArg::MedianCut => Algorithm::MedianCut,
            AlgorithmArg::KMeans => Algorithm::KMeans,
        });
    }
    if args.ignore_white {
        builder = builder.ignore_white(true);
    } else if args.keep_white {
        builder = builder.ignore_white(false);
    }
    builder.build()
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nitro_palette=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::debug!(?config, "extraction settings");

    let mut reports = Vec::new();
    for input in &args.inputs {
        let img = image::open(input)
            .with_context(|| format!("decoding {}", input.display()))?
            .to_rgba8();
        let palette = extract(RawImage::from(&img), &config)
            .with_context(|| format!("extracting palette from {}", input.display()))?;

        match args.format {
            OutputFormat::Json => reports.push(FileReport {
                file: input,
                palette,
            }),
            OutputFormat::Hex | OutputFormat::Css => {
                let notation = match args.format {
                    OutputFormat::Hex => ColorNotation::Hex,
                    _ => ColorNotation::Css,
                };
                println!("{}", input.display());
                for record in palette.records() {
                    println!("  {} {:.4}", record.render(notation), record.weight);
                }
            }
        }
    }

    if matches!(args.format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}
