//! Output writers for harvested records.
//!
//! # Submodules
//!
//! - [`jsonl`]: one JSON object per line
//! - [`csv`]: a header row followed by one row per record
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_2024-05-15.jsonl
//! └── news_2024-05-15.csv
//! ```
//!
//! Both formats carry the fields `url, source, title, date, content` in that
//! order; `date` is RFC 3339 or absent.

use crate::models::reference_tz;
use chrono::{DateTime, FixedOffset};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub mod csv;
pub mod jsonl;

/// Which files a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON-lines only.
    Jsonl,
    /// CSV only.
    Csv,
    /// Both JSON-lines and CSV.
    Both,
}

impl OutputFormat {
    pub fn writes_jsonl(self) -> bool {
        matches!(self, OutputFormat::Jsonl | OutputFormat::Both)
    }

    pub fn writes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

/// `YYYY-MM-DD` of the run, in the reference timezone.
pub fn date_stamp(now: DateTime<FixedOffset>) -> String {
    now.with_timezone(&reference_tz()).format("%Y-%m-%d").to_string()
}

/// `{output_dir}/news_{stamp}.{extension}`
pub fn output_path(output_dir: &Path, stamp: &str, extension: &str) -> PathBuf {
    output_dir.join(format!("news_{stamp}.{extension}"))
}
