//! Article link discovery on listing pages.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Extract the admitted article links of a listing page.
///
/// Every anchor with a non-blank `href` is resolved against `listing_url`
/// (relative, protocol-relative and absolute hrefs alike) and kept when
/// `admit` accepts it. Fragments are dropped so `#comments` variants of an
/// article collapse onto one URL. Links come back in anchor order and may
/// repeat; the caller's visited set takes care of duplicates.
///
/// # Arguments
///
/// * `listing_html` - Body of the listing page
/// * `listing_url` - URL the body was fetched from, used as the base
/// * `admit` - The source's admission predicate
///
/// # Returns
///
/// Absolute URLs as strings. An unparsable `listing_url` yields no links.
#[instrument(level = "debug", skip(listing_html, admit))]
pub fn extract_links<F>(listing_html: &str, listing_url: &str, admit: F) -> Vec<String>
where
    F: Fn(&Url) -> bool,
{
    let Ok(base) = Url::parse(listing_url) else {
        debug!("Listing URL is not absolute; no links extracted");
        return Vec::new();
    };

    let document = Html::parse_document(listing_html);
    let mut anchors = 0usize;
    let mut links = Vec::new();

    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() {
            continue;
        }
        anchors += 1;

        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        if admit(&resolved) {
            links.push(resolved.to_string());
        }
    }

    debug!(anchors, admitted = links.len(), "Extracted listing links");
    links
}
