//! Readability-style title and main-content extraction.
//!
//! The body heuristic follows the classic Arc90 approach:
//! 1. Drop subtrees that are never content (`script`, `nav`, `footer`, ...)
//!    or whose class/id looks like boilerplate (menus, related news, ads).
//!    `<form>` and `<header>` often wrap a whole page, so they are only
//!    dropped inside the chosen content, never as ancestors of it
//! 2. Score every paragraph-like block by length and comma count and credit
//!    the score to its parent (fully) and grandparent (half)
//! 3. Weight candidates by class/id hints and penalise link-heavy ones
//! 4. Keep the best candidate plus its well-scored siblings
//!
//! When no paragraph qualifies, the cleaned text of the whole `<body>` is used.

use crate::utils::{char_len, collapse_whitespace};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Paragraphs shorter than this are not scored.
const MIN_PARAGRAPH_CHARS: usize = 25;

static UNLIKELY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)banner|breadcrumb|combx|comment|community|disqus|extra|footer|gdpr|header|legends|menu|navbar|navigation|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|share|advert|quang-?cao|binh-?luan|lien-?quan|tin-?khac|most-?view|xem-?nhieu",
    )
    .unwrap()
});

static MAYBE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)and|article|body|column|content|main|shadow").unwrap());

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|main|page|post|text|blog|story|detail|noi-?dung|chi-?tiet").unwrap()
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)hidden|banner|combx|comment|contact|foot|footnote|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget|quang-?cao|lien-?quan").unwrap()
});

static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p, pre, td, div").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:title']").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Elements whose subtree never contributes text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "aside", "footer", "iframe", "button",
    "select", "svg", "canvas",
];

/// Dropped below the content node but transparent as its ancestors.
const WRAPPER_TAGS: &[&str] = &["form", "header"];

/// Children that stop a `<div>` from being scored as a paragraph.
const BLOCK_TAGS: &[&str] = &[
    "div", "p", "table", "ul", "ol", "dl", "section", "article", "blockquote", "pre", "h1", "h2",
    "h3", "h4", "h5", "h6", "figure",
];

/// Title separators between a headline and a site name.
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: ", " » "];

/// Result of running the extractor over an article page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleContent {
    /// Heuristic headline, possibly empty.
    pub title: String,
    /// Literal `<title>` text, the second-chance title.
    pub raw_title: String,
    /// Whitespace-joined main-content text.
    pub body: String,
}

impl ArticleContent {
    /// The heuristic title, or the raw `<title>` text when it is empty.
    pub fn best_title(&self) -> &str {
        if self.title.is_empty() {
            &self.raw_title
        } else {
            &self.title
        }
    }
}

/// Extract title and main-content text from an article page.
///
/// Never fails; a page with no recognisable content yields an empty body,
/// which the harvest pipeline rejects through its minimum-length gate.
#[instrument(level = "debug", skip_all)]
pub fn extract_content(article_html: &str) -> ArticleContent {
    let document = Html::parse_document(article_html);

    let raw_title = raw_title(&document);
    let title = heuristic_title(&document, &raw_title);
    let body = main_content(&document).unwrap_or_else(|| body_text(&document));

    debug!(title = %title, chars = char_len(&body), "Extracted article content");
    ArticleContent {
        title,
        raw_title,
        body,
    }
}

/// The collapsed text of the first `<title>` element.
pub fn raw_title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .unwrap_or_default()
}

/// First non-empty of: `og:title`, first `<h1>`, `<title>` minus its site name.
fn heuristic_title(document: &Html, raw_title: &str) -> String {
    let og = || {
        document
            .select(&OG_TITLE)
            .next()
            .and_then(|m| m.value().attr("content"))
            .map(collapse_whitespace)
    };
    let h1 = || {
        document
            .select(&H1)
            .next()
            .map(|h| collapse_whitespace(&h.text().collect::<Vec<_>>().join(" ")))
    };
    let short = || Some(short_title(raw_title));

    let strategies: [&dyn Fn() -> Option<String>; 3] = [&og, &h1, &short];
    strategies
        .iter()
        .filter_map(|strategy| strategy())
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Strip a site-name segment from a `<title>`, keeping the longest part.
pub fn short_title(title: &str) -> String {
    let title = collapse_whitespace(title);
    for sep in TITLE_SEPARATORS {
        if title.contains(sep) {
            return title
                .split(sep)
                .map(str::trim)
                .max_by_key(|part| char_len(part))
                .unwrap_or_default()
                .to_string();
        }
    }
    title
}

fn tag<'a>(element: ElementRef<'a>) -> &'a str {
    element.value().name()
}

fn class_and_id(element: ElementRef<'_>) -> String {
    let value = element.value();
    format!(
        "{} {}",
        value.attr("class").unwrap_or_default(),
        value.attr("id").unwrap_or_default()
    )
}

fn is_unlikely(element: ElementRef<'_>) -> bool {
    if matches!(tag(element), "html" | "body" | "article" | "main") {
        return false;
    }
    let signature = class_and_id(element);
    if signature.trim().is_empty() {
        return false;
    }
    UNLIKELY.is_match(&signature) && !MAYBE_CANDIDATE.is_match(&signature)
}

fn is_excluded(element: ElementRef<'_>) -> bool {
    SKIP_TAGS.contains(&tag(element)) || is_unlikely(element)
}

fn is_dropped(element: ElementRef<'_>) -> bool {
    is_excluded(element) || WRAPPER_TAGS.contains(&tag(element))
}

/// Whether the element is dropped or sits below an excluded ancestor.
fn is_pruned(element: ElementRef<'_>) -> bool {
    is_dropped(element) || ancestor_elements(element).any(is_excluded)
}

fn ancestor_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    (*element).ancestors().filter_map(ElementRef::wrap)
}

fn is_paragraph_like(element: ElementRef<'_>) -> bool {
    match tag(element) {
        "div" => !element
            .children()
            .filter_map(ElementRef::wrap)
            .any(|child| BLOCK_TAGS.contains(&tag(child))),
        _ => true,
    }
}

fn collect_text<'a>(
    element: ElementRef<'a>,
    skip: fn(ElementRef<'_>) -> bool,
    out: &mut Vec<&'a str>,
) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    out.push(t);
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    if !skip(el) {
                        collect_text(el, skip, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Visible text of an element with excluded subtrees removed.
fn clean_text(element: ElementRef<'_>) -> String {
    text_without(element, is_dropped)
}

fn text_without(element: ElementRef<'_>, skip: fn(ElementRef<'_>) -> bool) -> String {
    let mut parts = Vec::new();
    collect_text(element, skip, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn link_density(element: ElementRef<'_>, text_chars: usize) -> f64 {
    if text_chars == 0 {
        return 1.0;
    }
    let link_chars: usize = element
        .select(&ANCHORS)
        .filter(|a| !is_pruned(*a))
        .map(|a| char_len(&clean_text(a)))
        .sum();
    (link_chars as f64 / text_chars as f64).min(1.0)
}

fn initial_score(element: ElementRef<'_>) -> f64 {
    let base = match tag(element) {
        "div" | "article" | "main" | "section" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    base + class_weight(element)
}

fn class_weight(element: ElementRef<'_>) -> f64 {
    let mut weight = 0.0;
    for attr in ["class", "id"] {
        if let Some(value) = element.value().attr(attr).filter(|v| !v.is_empty()) {
            if NEGATIVE.is_match(value) {
                weight -= 25.0;
            }
            if POSITIVE.is_match(value) {
                weight += 25.0;
            }
        }
    }
    weight
}

/// Locate the main-content subtree and flatten it to text.
fn main_content(document: &Html) -> Option<String> {
    let mut candidates = HashMap::new();

    for paragraph in document.select(&PARAGRAPHS) {
        if !is_paragraph_like(paragraph) || is_pruned(paragraph) {
            continue;
        }
        let text = clean_text(paragraph);
        let chars = char_len(&text);
        if chars < MIN_PARAGRAPH_CHARS {
            continue;
        }

        let score = 1.0 + text.matches(',').count() as f64 + (chars / 100).min(3) as f64;

        let mut ancestors = ancestor_elements(paragraph);
        for share in [1.0, 0.5] {
            let Some(ancestor) = ancestors.next() else {
                break;
            };
            candidates
                .entry(ancestor.id())
                .or_insert_with(|| (ancestor, initial_score(ancestor)))
                .1 += score * share;
        }
    }

    let scored: HashMap<_, _> = candidates
        .into_iter()
        .map(|(id, (element, score))| {
            let chars = char_len(&clean_text(element));
            (id, (element, score * (1.0 - link_density(element, chars))))
        })
        .collect();

    let (top, top_score) = scored
        .values()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let threshold = (top_score * 0.2).max(10.0);
    let parts: Vec<String> = match top.parent().and_then(ElementRef::wrap) {
        Some(parent) => parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| {
                if sibling.id() == top.id() {
                    return true;
                }
                if is_dropped(*sibling) {
                    return false;
                }
                if scored.get(&sibling.id()).is_some_and(|(_, s)| *s >= threshold) {
                    return true;
                }
                if tag(*sibling) == "p" {
                    let text = clean_text(*sibling);
                    let chars = char_len(&text);
                    return chars > 80 && link_density(*sibling, chars) < 0.25;
                }
                false
            })
            .map(clean_text)
            .collect(),
        None => vec![clean_text(top)],
    };

    let text = collapse_whitespace(&parts.join(" "));
    debug!(top_score, chars = char_len(&text), "Selected main content");
    (!text.is_empty()).then_some(text)
}

/// Cleaned text of `<body>`, or of the whole document when there is none.
///
/// A page wrapped in a single `<form>` or `<header>` would clean down to
/// nothing, so those wrappers are kept when the strict pass comes back empty.
fn body_text(document: &Html) -> String {
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    let text = clean_text(root);
    if text.is_empty() {
        text_without(root, is_excluded)
    } else {
        text
    }
}
