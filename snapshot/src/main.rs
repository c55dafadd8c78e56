use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use radiation_core::{MeasurementStats, ViewConfig, ViewMode};
use snapshot_core::{raster, read_measurements, render_svg};

type CliError = Box<dyn std::error::Error>;

#[derive(Parser, Debug)]
#[command(name = "snapshot")]
#[command(about = "Render a bGeigie import as a radiation map image")]
#[command(version)]
struct Cli {
    /// Measurement listing (JSON) or a raw bGeigie drive log.
    input: PathBuf,
    /// Output image; `.png` is rasterised, anything else is written as SVG.
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = ModeArg::Markers)]
    mode: ModeArg,
    #[arg(long, default_value_t = 1024)]
    width: u32,
    #[arg(long, default_value_t = 768)]
    height: u32,
    /// JSON file overriding marker and heat layer options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Increase log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Markers,
    Heatmap,
}

impl From<ModeArg> for ViewMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Markers => ViewMode::Markers,
            ModeArg::Heatmap => ViewMode::Heatmap,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => OutputFormat::Png,
            _ => OutputFormat::Svg,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    tracing::info!("Reading {}", cli.input.display());
    let text = fs::read_to_string(&cli.input).map_err(|e| -> CliError {
        format!("Failed to read {}: {}", cli.input.display(), e).into()
    })?;
    let measurements = read_measurements(&text)?;
    match MeasurementStats::from_measurements(&measurements) {
        Some(s) => tracing::info!(
            "{} measurements, avg {:.1} CPM, min {} CPM, max {} CPM",
            s.total,
            s.avg_cpm,
            s.min_cpm,
            s.max_cpm
        ),
        None => tracing::warn!("No measurements in {}", cli.input.display()),
    }

    let config = match &cli.config {
        Some(path) => ViewConfig::from_json(&fs::read_to_string(path)?)?,
        None => ViewConfig::default(),
    };
    let (svg, outcome) = render_svg(measurements, cli.mode.into(), cli.width, cli.height, config);
    tracing::info!("Rendered {:?}", outcome);

    match OutputFormat::from_path(&cli.output) {
        OutputFormat::Png => fs::write(&cli.output, raster::svg_to_png(&svg, cli.width, cli.height)?)?,
        OutputFormat::Svg => fs::write(&cli.output, svg)?,
    }
    tracing::info!("Wrote {}", cli.output.display());
    Ok(())
}
