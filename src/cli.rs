//! Command-line interface definitions for the harvester.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use crate::harvest::{DEFAULT_DAYS, DEFAULT_MAX_PAGES, HarvestSettings};
use crate::outputs::OutputFormat;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the news harvester.
///
/// # Examples
///
/// ```sh
/// # Last 30 days, 8 listing pages per source, JSON-lines into ./data
/// stock_news_harvester
///
/// # One week, both formats, custom source catalog
/// stock_news_harvester --days 7 -f both -s sources.yaml -o /srv/news
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Lookback window in days
    #[arg(short, long, env = "HARVEST_DAYS", default_value_t = DEFAULT_DAYS)]
    pub days: u32,

    /// Listing pages to crawl per source and pagination pattern
    #[arg(short = 'p', long, env = "HARVEST_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Output directory for the harvested files
    #[arg(short, long, env = "HARVEST_OUTPUT_DIR", default_value = "data")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(short, long, env = "HARVEST_FORMAT", value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// Optional YAML source catalog replacing the built-in sources
    #[arg(short, long, env = "HARVEST_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Pause after each article fetch, in milliseconds
    #[arg(long, env = "HARVEST_DELAY_MS", default_value_t = 200)]
    pub delay_ms: u64,
}

impl Cli {
    /// Harvest parameters derived from the arguments.
    pub fn settings(&self) -> HarvestSettings {
        HarvestSettings {
            days: self.days,
            max_pages: self.max_pages,
            politeness_delay: Duration::from_millis(self.delay_ms),
        }
    }
}
