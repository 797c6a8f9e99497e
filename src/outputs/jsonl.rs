//! JSON-lines output.
//!
//! Each record is serialised on its own line. Non-ASCII text is written as
//! UTF-8, not escaped, so Vietnamese titles stay readable.

use crate::models::ArticleRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialise records as newline-terminated JSON objects.
pub fn to_jsonl(records: &[ArticleRecord]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write `records` to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_jsonl(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let body = to_jsonl(records)?;
    fs::write(path, body).await?;
    info!("Wrote JSON-lines file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reference_tz;
    use chrono::TimeZone;

    fn records() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord {
                url: "https://cafef.vn/a-1.chn".to_string(),
                source: "CafeF".to_string(),
                title: "Khối ngoại mua ròng".to_string(),
                date: Some(reference_tz().with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()),
                content: "Nội dung".to_string(),
            },
            ArticleRecord {
                url: "https://vietstock.vn/b-2.htm".to_string(),
                source: "Vietstock".to_string(),
                title: String::new(),
                date: None,
                content: "Dòng \"trích dẫn\"\nxuống dòng".to_string(),
            },
        ]
    }

    #[test]
    fn test_one_line_per_record() {
        let out = to_jsonl(&records()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(r#"{"url":"https://cafef.vn/a-1.chn","source":"CafeF""#));
        assert!(lines[0].contains(r#""date":"2024-03-01T10:00:00+07:00""#));
        assert!(lines[1].contains(r#""date":null"#));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_lines_parse_back() {
        let out = to_jsonl(&records()).unwrap();
        let parsed: Vec<ArticleRecord> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed, records());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_jsonl(&[]).unwrap(), "");
    }

    #[tokio::test]
    async fn test_write_jsonl() {
        let path = std::env::temp_dir().join(format!("harvester-jsonl-{}.jsonl", std::process::id()));
        write_jsonl(&records(), &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Khối ngoại mua ròng"));
        std::fs::remove_file(&path).unwrap();
    }
}
