//! News source descriptors.
//!
//! Each outlet is described by data, not code: a base listing URL, the
//! pagination patterns to try, and an [`AdmissionRule`] deciding which
//! discovered links are articles of that outlet. The orchestrator evaluates
//! every descriptor the same way.
//!
//! # Built-in Sources
//!
//! | Source | Listing | Article suffix |
//! |--------|---------|----------------|
//! | CafeF | `https://cafef.vn/thi-truong-chung-khoan.chn` | `.chn` |
//! | Vietstock | `https://vietstock.vn/chung-khoan.htm` | `.htm` |
//!
//! A YAML catalog can replace the built-ins:
//!
//! ```yaml
//! - name: CafeF
//!   base_url: https://cafef.vn/thi-truong-chung-khoan.chn
//!   domain: cafef.vn
//!   suffixes: [".chn"]
//!   patterns: [query_p, query_page]
//! ```

use crate::pagination::{PaginationPattern, STANDARD_PATTERNS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

/// Errors raised while loading a source catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read source catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid source catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid source `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

/// Per-source test deciding whether a URL is one of its articles.
///
/// Both conditions must hold: the host is the source's domain (or a
/// subdomain of it), and the URL, without fragment, ends with one of the
/// article suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdmissionRule {
    /// Registrable domain, e.g. `cafef.vn`.
    pub domain: String,
    /// Accepted URL endings, e.g. `.chn`.
    pub suffixes: Vec<String>,
}

impl AdmissionRule {
    pub fn new(domain: &str, suffixes: &[&str]) -> Self {
        Self {
            domain: domain.to_ascii_lowercase(),
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether `url` is admitted as an article link.
    pub fn admits(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain_ok = host == self.domain || host.ends_with(&format!(".{}", self.domain));
        if !domain_ok {
            return false;
        }

        let mut without_fragment = url.clone();
        without_fragment.set_fragment(None);
        let s = without_fragment.as_str();
        self.suffixes.iter().any(|suffix| s.ends_with(suffix.as_str()))
    }
}

/// One news outlet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Name stamped on every record from this source.
    pub name: String,
    /// The first listing page.
    pub base_url: String,
    /// Pagination patterns to generate listing pages with.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<PaginationPattern>,
    /// Article admission predicate.
    #[serde(flatten)]
    pub admission: AdmissionRule,
}

fn default_patterns() -> Vec<PaginationPattern> {
    STANDARD_PATTERNS.to_vec()
}

impl SourceDescriptor {
    /// Shorthand for [`AdmissionRule::admits`].
    pub fn admits(&self, url: &Url) -> bool {
        self.admission.admits(url)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if Url::parse(&self.base_url).is_err() {
            return Err(invalid("base_url is not an absolute URL"));
        }
        if self.admission.domain.trim().is_empty() {
            return Err(invalid("domain is empty"));
        }
        if self.admission.suffixes.iter().all(|s| s.is_empty()) {
            return Err(invalid("at least one non-empty suffix is required"));
        }
        Ok(())
    }
}

/// The sources harvested when no catalog file is given.
pub fn builtin_sources() -> Vec<SourceDescriptor> {
    let mut cafef_patterns = STANDARD_PATTERNS.to_vec();
    cafef_patterns.push(PaginationPattern::QueryP);

    vec![
        SourceDescriptor {
            name: "CafeF".to_string(),
            base_url: "https://cafef.vn/thi-truong-chung-khoan.chn".to_string(),
            patterns: cafef_patterns,
            admission: AdmissionRule::new("cafef.vn", &[".chn"]),
        },
        SourceDescriptor {
            name: "Vietstock".to_string(),
            base_url: "https://vietstock.vn/chung-khoan.htm".to_string(),
            patterns: STANDARD_PATTERNS.to_vec(),
            admission: AdmissionRule::new("vietstock.vn", &[".htm"]),
        },
    ]
}

/// Parse and validate a YAML source catalog.
pub fn parse_catalog(yaml: &str) -> Result<Vec<SourceDescriptor>, CatalogError> {
    let mut sources: Vec<SourceDescriptor> = serde_yaml::from_str(yaml)?;
    for source in &mut sources {
        source.admission.domain = source.admission.domain.trim().to_ascii_lowercase();
        source.validate()?;
    }
    Ok(sources)
}

/// Load a YAML source catalog from disk.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<SourceDescriptor>, CatalogError> {
    let yaml = std::fs::read_to_string(path.as_ref())?;
    let sources = parse_catalog(&yaml)?;
    info!(count = sources.len(), "Loaded source catalog");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cafef() -> SourceDescriptor {
        builtin_sources().into_iter().next().unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_admits_own_article() {
        assert!(cafef().admits(&url("https://cafef.vn/vn-index-tang-manh-188240301.chn")));
    }

    #[test]
    fn test_admits_subdomain() {
        assert!(cafef().admits(&url("https://m.cafef.vn/vn-index-tang-manh-188240301.chn")));
    }

    #[test]
    fn test_rejects_cross_source_link() {
        assert!(!cafef().admits(&url("https://vietstock.vn/foo.htm")));
        assert!(!cafef().admits(&url("https://vietstock.vn/foo.chn")));
    }

    #[test]
    fn test_rejects_lookalike_domain() {
        assert!(!cafef().admits(&url("https://notcafef.vn/bai-viet.chn")));
    }

    #[test]
    fn test_rejects_wrong_suffix() {
        assert!(!cafef().admits(&url("https://cafef.vn/thi-truong-chung-khoan.chn?p=2")));
        assert!(!cafef().admits(&url("https://cafef.vn/tag/ngan-hang.html")));
    }

    #[test]
    fn test_fragment_is_ignored_for_suffix() {
        assert!(cafef().admits(&url("https://cafef.vn/bai-viet-1882.chn#comments")));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(!cafef().admits(&url("ftp://cafef.vn/bai-viet.chn")));
    }

    #[test]
    fn test_builtin_sources() {
        let sources = builtin_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].name, "Vietstock");
        assert!(sources[0].patterns.contains(&PaginationPattern::QueryP));
        assert_eq!(sources[1].patterns, STANDARD_PATTERNS.to_vec());
    }

    #[test]
    fn test_parse_catalog_with_default_patterns() {
        let yaml = r#"
- name: NDH
  base_url: https://ndh.vn/chung-khoan
  domain: NDH.vn
  suffixes: [".html"]
"#;
        let sources = parse_catalog(yaml).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].admission.domain, "ndh.vn");
        assert_eq!(sources[0].patterns, STANDARD_PATTERNS.to_vec());
        assert!(sources[0].admits(&url("https://ndh.vn/co-phieu-1.html")));
    }

    #[test]
    fn test_parse_catalog_with_explicit_patterns() {
        let yaml = r#"
- name: CafeF
  base_url: https://cafef.vn/thi-truong-chung-khoan.chn
  domain: cafef.vn
  suffixes: [".chn"]
  patterns: [query_p]
"#;
        let sources = parse_catalog(yaml).unwrap();
        assert_eq!(sources[0].patterns, vec![PaginationPattern::QueryP]);
    }

    #[test]
    fn test_parse_catalog_rejects_relative_base_url() {
        let yaml = r#"
- name: Broken
  base_url: /chung-khoan
  domain: example.vn
  suffixes: [".htm"]
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid { .. }));
    }

    #[test]
    fn test_parse_catalog_rejects_missing_suffixes() {
        let yaml = r#"
- name: Broken
  base_url: https://example.vn/
  domain: example.vn
  suffixes: []
"#;
        assert!(parse_catalog(yaml).is_err());
    }
}
