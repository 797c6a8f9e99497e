//! Listing-page URL generation.
//!
//! News sites paginate their category listings in a handful of ways. Rather
//! than encoding the real scheme of every site, the harvester generates the
//! candidate URLs of several known schemes and lets the pages that do not
//! exist fail harmlessly at fetch time.
//!
//! | Pattern | Page 3 of `https://site.vn/chung-khoan.htm` |
//! |---------|---------------------------------------------|
//! | [`QueryPage`](PaginationPattern::QueryPage) | `https://site.vn/chung-khoan.htm?page=3` |
//! | [`QueryTrang`](PaginationPattern::QueryTrang) | `https://site.vn/chung-khoan.htm?trang=3` |
//! | [`TrangSegment`](PaginationPattern::TrangSegment) | `https://site.vn/chung-khoan.htm/trang-3.htm` |
//! | [`PathP`](PaginationPattern::PathP) | `https://site.vn/chung-khoan.htm/p3` |
//! | [`SlashQueryP`](PaginationPattern::SlashQueryP) | `https://site.vn/chung-khoan.htm/?p=3` |
//! | [`QueryP`](PaginationPattern::QueryP) | `https://site.vn/chung-khoan.htm?p=3` |

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A known way of addressing page `N` of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationPattern {
    /// `?page=N`
    QueryPage,
    /// `?trang=N`
    QueryTrang,
    /// `/trang-N.htm`
    TrangSegment,
    /// `/pN`
    PathP,
    /// `/?p=N`
    SlashQueryP,
    /// `?p=N`
    QueryP,
}

/// The patterns applied when a source does not name its own, in generation order.
pub const STANDARD_PATTERNS: [PaginationPattern; 5] = [
    PaginationPattern::QueryPage,
    PaginationPattern::QueryTrang,
    PaginationPattern::TrangSegment,
    PaginationPattern::PathP,
    PaginationPattern::SlashQueryP,
];

impl PaginationPattern {
    /// Build the URL of `page` under this pattern.
    ///
    /// Query patterns extend an existing query string with `&`; path patterns
    /// are inserted before any query string so `?x=1` survives.
    pub fn page_url(self, base_url: &str, page: usize) -> String {
        let (path, query) = match base_url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (base_url, None),
        };

        match self {
            PaginationPattern::QueryPage => with_query_param(base_url, "page", page),
            PaginationPattern::QueryTrang => with_query_param(base_url, "trang", page),
            PaginationPattern::QueryP => with_query_param(base_url, "p", page),
            PaginationPattern::TrangSegment => {
                with_path_segment(path, query, &format!("trang-{page}.htm"))
            }
            PaginationPattern::PathP => with_path_segment(path, query, &format!("p{page}")),
            PaginationPattern::SlashQueryP => match query {
                Some(q) if !q.is_empty() => {
                    format!("{}/?{}&p={}", path.trim_end_matches('/'), q, page)
                }
                _ => format!("{}/?p={}", path.trim_end_matches('/'), page),
            },
        }
    }
}

fn with_query_param(base_url: &str, name: &str, page: usize) -> String {
    let sep = if base_url.contains('?') {
        if base_url.ends_with('?') || base_url.ends_with('&') {
            ""
        } else {
            "&"
        }
    } else {
        "?"
    };
    format!("{base_url}{sep}{name}={page}")
}

fn with_path_segment(path: &str, query: Option<&str>, segment: &str) -> String {
    let path = path.trim_end_matches('/');
    match query {
        Some(q) if !q.is_empty() => format!("{path}/{segment}?{q}"),
        _ => format!("{path}/{segment}"),
    }
}

/// Generate the listing URLs of `base_url` using the standard patterns.
///
/// See [`listing_urls_with`].
pub fn listing_urls(base_url: &str, max_pages: usize) -> Vec<String> {
    listing_urls_with(base_url, max_pages, &STANDARD_PATTERNS)
}

/// Generate the ordered, duplicate-free candidate listing URLs of a source.
///
/// The bare `base_url` always comes first. Then, pattern by pattern, pages
/// `2..=max_pages` are generated (pattern-major order). Duplicates are
/// removed by exact string match, keeping the first occurrence.
///
/// # Arguments
///
/// * `base_url` - The first listing page of the source
/// * `max_pages` - The page budget; values below 2 yield only the base URL
/// * `patterns` - The pagination patterns to apply, in order
#[instrument(level = "debug", skip(patterns))]
pub fn listing_urls_with(
    base_url: &str,
    max_pages: usize,
    patterns: &[PaginationPattern],
) -> Vec<String> {
    let urls: Vec<String> = std::iter::once(base_url.to_string())
        .chain(
            patterns
                .iter()
                .flat_map(|pattern| (2..=max_pages).map(move |page| pattern.page_url(base_url, page))),
        )
        .unique()
        .collect();

    debug!(count = urls.len(), "Generated listing URLs");
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://vietstock.vn/chung-khoan.htm";

    #[test]
    fn test_base_url_comes_first() {
        let urls = listing_urls(BASE, 3);
        assert_eq!(urls[0], BASE);
    }

    #[test]
    fn test_pattern_major_order() {
        let urls = listing_urls(BASE, 3);
        assert_eq!(
            urls,
            vec![
                BASE.to_string(),
                format!("{BASE}?page=2"),
                format!("{BASE}?page=3"),
                format!("{BASE}?trang=2"),
                format!("{BASE}?trang=3"),
                format!("{BASE}/trang-2.htm"),
                format!("{BASE}/trang-3.htm"),
                format!("{BASE}/p2"),
                format!("{BASE}/p3"),
                format!("{BASE}/?p=2"),
                format!("{BASE}/?p=3"),
            ]
        );
    }

    #[test]
    fn test_budget_of_one_yields_only_base() {
        assert_eq!(listing_urls(BASE, 1), vec![BASE.to_string()]);
        assert_eq!(listing_urls(BASE, 0), vec![BASE.to_string()]);
    }

    #[test]
    fn test_deterministic_and_unique() {
        let a = listing_urls(BASE, 8);
        let b = listing_urls(BASE, 8);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1 + 5 * 7);
        assert_eq!(a.iter().unique().count(), a.len());
    }

    #[test]
    fn test_duplicate_patterns_are_collapsed() {
        let patterns = [PaginationPattern::QueryPage, PaginationPattern::QueryPage];
        let urls = listing_urls_with(BASE, 3, &patterns);
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn test_existing_query_is_extended() {
        let base = "https://cafef.vn/tin-tuc.chn?cat=1";
        assert_eq!(
            PaginationPattern::QueryPage.page_url(base, 2),
            "https://cafef.vn/tin-tuc.chn?cat=1&page=2"
        );
        assert_eq!(
            PaginationPattern::PathP.page_url(base, 2),
            "https://cafef.vn/tin-tuc.chn/p2?cat=1"
        );
        assert_eq!(
            PaginationPattern::SlashQueryP.page_url(base, 4),
            "https://cafef.vn/tin-tuc.chn/?cat=1&p=4"
        );
    }

    #[test]
    fn test_trailing_slash_is_not_doubled() {
        let base = "https://vietstock.vn/chung-khoan/";
        assert_eq!(
            PaginationPattern::TrangSegment.page_url(base, 5),
            "https://vietstock.vn/chung-khoan/trang-5.htm"
        );
        assert_eq!(
            PaginationPattern::QueryP.page_url(base, 2),
            "https://vietstock.vn/chung-khoan/?p=2"
        );
    }
}
