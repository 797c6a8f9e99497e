//! # Stock News Harvester
//!
//! A time-windowed harvester for Vietnamese financial news. It discovers
//! article URLs from paginated listing pages, fetches each article, extracts
//! a clean title, body and publication date, keeps what is recent, and
//! writes the deduplicated records to JSON-lines and/or CSV.
//!
//! ## Usage
//!
//! ```sh
//! stock_news_harvester --days 30 --max-pages 8 -o ./data
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Pagination**: Generate candidate listing pages per source
//! 2. **Discovery**: Admit article links from each listing page
//! 3. **Fetching**: Download each new article (bounded retries, polite pacing)
//! 4. **Extraction**: Resolve the date, drop stale ones, extract title and body
//! 5. **Output**: Write one file per format, stamped with the run date

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod content;
mod dates;
mod fetch;
mod harvest;
mod links;
mod models;
mod outputs;
mod pagination;
mod sources;
mod utils;

use cli::Cli;
use fetch::default_fetcher;
use harvest::Harvester;
use models::reference_tz;
use outputs::{csv, date_stamp, jsonl, output_path};
use sources::{builtin_sources, load_catalog};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("stock_news_harvester starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Early check: ensure the output dir is writable before spending time crawling
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let sources = match &args.sources {
        Some(path) => load_catalog(path)?,
        None => builtin_sources(),
    };
    info!(
        sources = ?sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "Sources configured"
    );

    // ---- Harvest ----
    let harvester = Harvester::new(default_fetcher()?, sources, args.settings());
    let run_start = chrono::Utc::now().with_timezone(&reference_tz());
    let outcome = harvester.harvest_at(run_start).await;

    // ---- Output ----
    let stamp = date_stamp(run_start);
    if args.format.writes_jsonl() {
        let path = output_path(&args.output_dir, &stamp, "jsonl");
        jsonl::write_jsonl(&outcome.records, &path).await?;
    }
    if args.format.writes_csv() {
        let path = output_path(&args.output_dir, &stamp, "csv");
        csv::write_csv(&outcome.records, &path).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        articles = outcome.records.len(),
        secs = elapsed.as_secs(),
        "Wrote {} articles.",
        outcome.records.len()
    );

    Ok(())
}
