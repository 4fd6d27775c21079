//! Cell Lineage CLI Application
//!
//! Command-line front end for the cell-lineage library. It adds:
//! - Loading detection records and manual tracks (JSON)
//! - Run configuration (config.toml) with command-line overrides
//! - Track filtering
//! - Report generation (TXT/JSON)

use anyhow::{Context, Result};
use cell_lineage::{LineageTracker, TrackId, TrackIndex};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod loader;
mod report;

use config::{AppConfig, OutputFormat};

/// Cell Lineage - Reconstruct cell tracks and divisions from nucleus detections
#[derive(Parser, Debug)]
#[command(name = "cell-lineage-cli")]
#[command(about = "Reconstruct cell lineages from per-frame detections", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the detection file (JSON)
    #[arg(short, long, value_name = "FILE")]
    detections: Option<PathBuf>,

    /// Path to manual track annotations (JSON)
    #[arg(long, value_name = "FILE")]
    manual: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Keep only tracks lasting at least this many frames
    #[arg(long, value_name = "COUNT")]
    min_frames: Option<usize>,

    /// Track index to exclude (can be repeated)
    #[arg(long, value_name = "INDEX")]
    black_list: Vec<TrackId>,

    /// Report every track, ignoring filters
    #[arg(long)]
    unfiltered: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Cell Lineage CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using lineage library v{}", cell_lineage::VERSION);

    let config = match (&args.config, &args.detections) {
        (Some(config_path), _) => {
            log::info!("Loading configuration from: {:?}", config_path);
            config::load_config(config_path)?
        }
        (None, Some(detections)) => AppConfig::for_detections(detections.clone()),
        (None, None) => {
            println!("Cell Lineage - No input specified");
            println!("\nQuick Start:");
            println!("  cell-lineage-cli --detections detections.json");
            println!("  cell-lineage-cli --detections detections.json --min-frames 10");
            println!("\nWith a run configuration:");
            println!("  cell-lineage-cli --config config.toml");
            println!("\nUse --help for more options");
            return Ok(());
        }
    };

    let config = apply_overrides(config, &args);
    run(&config)
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(mut config: AppConfig, args: &Args) -> AppConfig {
    if let (Some(_), Some(detections)) = (&args.config, &args.detections) {
        config.input.detections = detections.clone();
    }
    if args.manual.is_some() {
        config.input.manual_tracks = args.manual.clone();
    }
    if args.output.is_some() {
        config.output.path = args.output.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(min_frames) = args.min_frames {
        config.filtering.min_frames = Some(min_frames);
    }
    if !args.black_list.is_empty() {
        config.filtering.black_list = args.black_list.clone();
    }
    if args.unfiltered {
        config.output.filtered = false;
    }
    config
}

/// Load, track, filter and report
fn run(config: &AppConfig) -> Result<()> {
    let store = loader::load_detections(&config.input.detections)?;
    let manual = config
        .input
        .manual_tracks
        .as_deref()
        .map(loader::load_manual_tracks)
        .transpose()?;

    let lineage = LineageTracker::run(&store);
    if !lineage.issues().is_empty() {
        log::warn!(
            "{} detections were dropped from the lineage",
            lineage.issues().len()
        );
    }

    let mut index = TrackIndex::new(Arc::new(store), Arc::new(lineage));
    if !config.filtering.is_empty() {
        index.apply_filter_config(&config.filtering);
    }

    let report = report::Report::build(
        &index,
        &config.scale,
        config.output.filtered,
        manual.as_ref(),
    )?;

    let rendered = match config.output.format {
        OutputFormat::Txt => report::render_txt(&report)?,
        OutputFormat::Json => report::render_json(&report)?,
    };

    match &config.output.path {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
