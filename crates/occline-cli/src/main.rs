//! occline - biodiversity occurrence harvesting pipeline
//!
//! Pulls species-occurrence records for one taxonomic family from GBIF,
//! filters and normalizes them, deduplicates, and writes genus-partitioned
//! Parquet + JSONL along with reference catalogs and a quality report.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "occline")]
#[command(about = "Harvest occurrence records for a taxonomic family from GBIF")]
#[command(version)]
struct Cli {
    /// Maximum number of records to harvest (default from config, 10000)
    max_records: Option<usize>,

    /// Taxonomic family to harvest (overrides config)
    #[arg(long)]
    family: Option<String>,

    /// Output root directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path (default: ./occline.toml or ~/.config/occline/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = occline_core::ProgressContext::new();

    // TTY: log lines route through the progress area; non-TTY: plain lines
    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    occline_core::init_logging(cli.debug, multi);

    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    if let Some(family) = cli.family {
        config.harvest.family = family;
    }

    let harvest = occline_harvest::HarvestConfig {
        base_url: config.harvest.base_url.clone(),
        family: config.harvest.family.clone(),
        dataset_name: config.dataset_name(),
        output_root: cli.output.unwrap_or_else(|| config.output.root_dir.clone()),
        max_records: cli.max_records.unwrap_or(config.harvest.max_records),
        page_size: config.harvest.page_size,
        page_delay: Duration::from_millis(config.harvest.page_delay_ms),
        zstd_level: config.output.compression_level,
        media_sample_size: config.media.sample_size,
        media_per_record_cap: config.media.per_record_cap,
    };

    // Fatal errors (resolution, paging, partition write) exit non-zero;
    // zero harvested records is a logged condition, not a failure.
    occline_harvest::run(&harvest, &progress)?;
    Ok(())
}
