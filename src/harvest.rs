//! The harvest pipeline.
//!
//! [`Harvester`] drives every stage for each configured source:
//!
//! 1. **Pagination**: generate candidate listing URLs ([`crate::pagination`])
//! 2. **Discovery**: fetch each listing page and admit article links ([`crate::links`])
//! 3. **Claiming**: mark each new URL visited *before* fetching it
//! 4. **Fetching**: download the article; failures are skipped
//! 5. **Recency gate**: drop articles dated strictly before the cutoff ([`crate::dates`])
//! 6. **Extraction**: title and body; bodies under 200 characters are dropped ([`crate::content`])
//! 7. **Recording**: truncate the body to 20,000 characters and keep the record
//!
//! Sources, listing pages and articles are processed sequentially, with a
//! fixed politeness pause after every article fetch. Nothing in the
//! pipeline aborts the run; every failure just skips a page.

use crate::content::extract_content;
use crate::dates::resolve_date;
use crate::fetch::PageFetcher;
use crate::links::extract_links;
use crate::models::{ArticleRecord, reference_tz};
use crate::pagination::listing_urls_with;
use crate::sources::SourceDescriptor;
use crate::utils::{char_len, truncate_chars, truncate_for_log};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Bodies shorter than this are not articles (stubs, redirects, index pages).
pub const MIN_CONTENT_CHARS: usize = 200;
/// Stored bodies are cut to this many characters.
pub const MAX_CONTENT_CHARS: usize = 20_000;
/// Pause after each article fetch.
pub const POLITENESS_DELAY: Duration = Duration::from_millis(200);
/// Default lookback window in days.
pub const DEFAULT_DAYS: u32 = 30;
/// Default per-source listing page budget.
pub const DEFAULT_MAX_PAGES: usize = 8;

/// Run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Lookback window; articles older than `now - days` are dropped.
    pub days: u32,
    /// Listing page budget per source and pattern.
    pub max_pages: usize,
    /// Pause after every article fetch.
    pub politeness_delay: Duration,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            max_pages: DEFAULT_MAX_PAGES,
            politeness_delay: POLITENESS_DELAY,
        }
    }
}

/// URLs already claimed during one run. Insert-only.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    /// Claim `url`; returns `false` if it was already claimed.
    pub fn claim(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Why an admitted, fetched article produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Publication date strictly before the cutoff.
    Stale,
    /// Extracted body under [`MIN_CONTENT_CHARS`].
    TooShort,
}

/// Per-run counters, logged when the run ends.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestStats {
    pub listing_pages: usize,
    pub listing_failures: usize,
    pub links_admitted: usize,
    pub duplicates: usize,
    pub article_failures: usize,
    pub stale: usize,
    pub too_short: usize,
    pub accepted: usize,
}

/// Records of one run plus its counters.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub records: Vec<ArticleRecord>,
    pub stats: HarvestStats,
}

/// Mutable bookkeeping owned by a single run.
struct Run {
    cutoff: DateTime<FixedOffset>,
    visited: VisitedSet,
    outcome: HarvestOutcome,
}

/// The earliest publication time still harvested.
pub fn cutoff(now: DateTime<FixedOffset>, days: u32) -> DateTime<FixedOffset> {
    now.with_timezone(&reference_tz()) - ChronoDuration::days(i64::from(days))
}

/// Turn a fetched article page into a record, or say why not.
///
/// Pure: date resolution, the recency gate, content extraction with title
/// fallback, the minimum-length gate and truncation.
pub fn build_record(
    source: &str,
    url: &str,
    article_html: &str,
    cutoff: DateTime<FixedOffset>,
) -> Result<ArticleRecord, SkipReason> {
    let date = resolve_date(article_html, url);
    if date.is_some_and(|d| d < cutoff) {
        return Err(SkipReason::Stale);
    }

    let content = extract_content(article_html);
    if char_len(&content.body) < MIN_CONTENT_CHARS {
        return Err(SkipReason::TooShort);
    }

    Ok(ArticleRecord {
        url: url.to_string(),
        source: source.to_string(),
        title: content.best_title().to_string(),
        date,
        content: truncate_chars(&content.body, MAX_CONTENT_CHARS).to_string(),
    })
}

/// Sequential, source-agnostic harvester.
///
/// # Example
///
/// ```ignore
/// let harvester = Harvester::new(default_fetcher()?, builtin_sources(), HarvestSettings::default());
/// let outcome = harvester.harvest().await;
/// ```
pub struct Harvester<F> {
    fetcher: F,
    sources: Vec<SourceDescriptor>,
    settings: HarvestSettings,
}

impl<F> Harvester<F>
where
    F: PageFetcher,
{
    pub fn new(fetcher: F, sources: Vec<SourceDescriptor>, settings: HarvestSettings) -> Self {
        Self {
            fetcher,
            sources,
            settings,
        }
    }

    /// Harvest all sources relative to the current time.
    pub async fn harvest(&self) -> HarvestOutcome {
        self.harvest_at(Utc::now().with_timezone(&reference_tz())).await
    }

    /// Harvest all sources with `now` as the run start time.
    ///
    /// A fresh [`VisitedSet`] is created for every call, so repeated runs in
    /// one process are independent.
    #[instrument(level = "info", skip(self), fields(days = self.settings.days, max_pages = self.settings.max_pages))]
    pub async fn harvest_at(&self, now: DateTime<FixedOffset>) -> HarvestOutcome {
        let t0 = Instant::now();
        let mut run = Run {
            cutoff: cutoff(now, self.settings.days),
            visited: VisitedSet::default(),
            outcome: HarvestOutcome::default(),
        };
        info!(cutoff = %run.cutoff.to_rfc3339(), sources = self.sources.len(), "Harvest starting");

        for source in &self.sources {
            let before = run.outcome.records.len();
            self.harvest_source(source, &mut run).await;
            info!(
                source = %source.name,
                records = run.outcome.records.len() - before,
                "Finished source"
            );
        }

        let stats = &run.outcome.stats;
        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            visited = run.visited.len(),
            listing_pages = stats.listing_pages,
            listing_failures = stats.listing_failures,
            links_admitted = stats.links_admitted,
            duplicates = stats.duplicates,
            article_failures = stats.article_failures,
            stale = stats.stale,
            too_short = stats.too_short,
            accepted = stats.accepted,
            "Harvest complete"
        );
        run.outcome
    }

    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    async fn harvest_source(&self, source: &SourceDescriptor, run: &mut Run) {
        let listing_urls =
            listing_urls_with(&source.base_url, self.settings.max_pages, &source.patterns);

        for listing_url in listing_urls {
            let listing_html = match self.fetcher.fetch(&listing_url).await {
                Ok(html) => html,
                Err(e) => {
                    debug!(%listing_url, error = %e, "Listing page unavailable; skipping");
                    run.outcome.stats.listing_failures += 1;
                    continue;
                }
            };
            run.outcome.stats.listing_pages += 1;

            let links = extract_links(&listing_html, &listing_url, |u| source.admits(u));
            run.outcome.stats.links_admitted += links.len();
            debug!(%listing_url, links = links.len(), "Scanned listing page");

            for url in links {
                if !run.visited.claim(&url) {
                    run.outcome.stats.duplicates += 1;
                    continue;
                }
                self.harvest_article(source, &url, run).await;
            }
        }
    }

    async fn harvest_article(&self, source: &SourceDescriptor, url: &str, run: &mut Run) {
        let fetched = self.fetcher.fetch(url).await;
        sleep(self.settings.politeness_delay).await;

        let article_html = match fetched {
            Ok(html) => html,
            Err(e) => {
                debug!(%url, error = %e, "Article unavailable; skipping");
                run.outcome.stats.article_failures += 1;
                return;
            }
        };

        match build_record(&source.name, url, &article_html, run.cutoff) {
            Ok(record) => {
                debug!(
                    %url,
                    title = %truncate_for_log(&record.title, 80),
                    date = ?record.date,
                    chars = char_len(&record.content),
                    "Accepted article"
                );
                run.outcome.stats.accepted += 1;
                run.outcome.records.push(record);
            }
            Err(SkipReason::Stale) => {
                debug!(%url, "Article older than cutoff; skipping");
                run.outcome.stats.stale += 1;
            }
            Err(SkipReason::TooShort) => {
                debug!(%url, "Article body too short; skipping");
                run.outcome.stats.too_short += 1;
            }
        }
    }
}
