//! Data models for harvested articles.
//!
//! This module defines the output unit of a harvest run, [`ArticleRecord`],
//! and the fixed reference timezone every resolved timestamp is normalised
//! into before it is compared against the cutoff or stored.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Offset of the reference timezone (Asia/Ho_Chi_Minh, UTC+07:00) in seconds.
const REFERENCE_OFFSET_SECS: i32 = 7 * 3600;

/// The fixed timezone all publication timestamps are expressed in.
///
/// Vietnam does not observe daylight saving time, so a fixed offset is exact.
pub fn reference_tz() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).expect("UTC+07:00 is a valid offset")
}

/// A harvested news article.
///
/// Records are created once per accepted article and never mutated. The
/// field order is the serialised column order used by every output writer.
///
/// # Fields
///
/// * `url` - Absolute article URL; unique within one run
/// * `source` - Name of the source descriptor that admitted the URL
/// * `title` - Best-effort title, possibly empty
/// * `date` - Publication time in the reference timezone, if resolvable
/// * `content` - Boilerplate-stripped body text, already truncated
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The canonical URL the article was fetched from.
    pub url: String,
    /// The source name, e.g. `"CafeF"`.
    pub source: String,
    /// The extracted title.
    pub title: String,
    /// The resolved publication timestamp, serialised as RFC 3339.
    pub date: Option<DateTime<FixedOffset>>,
    /// The plain-text article body.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(date: Option<DateTime<FixedOffset>>) -> ArticleRecord {
        ArticleRecord {
            url: "https://cafef.vn/co-phieu-ngan-hang-188240301.chn".to_string(),
            source: "CafeF".to_string(),
            title: "Cổ phiếu ngân hàng bứt phá".to_string(),
            date,
            content: "Nội dung bài viết".to_string(),
        }
    }

    #[test]
    fn test_reference_tz_is_utc_plus_seven() {
        assert_eq!(reference_tz().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_record_serializes_fields_in_order() {
        let date = reference_tz().with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let json = serde_json::to_string(&sample(Some(date))).unwrap();

        let url = json.find("\"url\"").unwrap();
        let source = json.find("\"source\"").unwrap();
        let title = json.find("\"title\"").unwrap();
        let date_pos = json.find("\"date\"").unwrap();
        let content = json.find("\"content\"").unwrap();
        assert!(url < source && source < title && title < date_pos && date_pos < content);
        assert!(json.contains("\"2024-03-01T10:00:00+07:00\""));
    }

    #[test]
    fn test_record_keeps_vietnamese_text_unescaped() {
        let json = serde_json::to_string(&sample(None)).unwrap();
        assert!(json.contains("Cổ phiếu ngân hàng"));
        assert!(json.contains("\"date\":null"));
    }

    #[test]
    fn test_record_deserialization() {
        let json = r#"{
            "url": "https://vietstock.vn/2024/05/10/some-article.htm",
            "source": "Vietstock",
            "title": "",
            "date": "2024-05-10T08:00:00+07:00",
            "content": "body"
        }"#;

        let record: ArticleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source, "Vietstock");
        assert_eq!(
            record.date,
            Some(reference_tz().with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap())
        );
    }
}
