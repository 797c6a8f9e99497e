//! CSV output.

use crate::models::ArticleRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialise records as CSV with a header row.
pub fn to_csv(records: &[ArticleRecord]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(["url", "source", "title", "date", "content"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Write `records` to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_csv(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let body = to_csv(records)?;
    fs::write(path, body).await?;
    info!("Wrote CSV file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reference_tz;
    use chrono::TimeZone;

    #[test]
    fn test_header_and_rows() {
        let records = vec![
            ArticleRecord {
                url: "https://cafef.vn/a-1.chn".to_string(),
                source: "CafeF".to_string(),
                title: "Giá thép, xi măng tăng".to_string(),
                date: Some(reference_tz().with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()),
                content: "Nội dung".to_string(),
            },
            ArticleRecord {
                url: "https://vietstock.vn/b-2.htm".to_string(),
                source: "Vietstock".to_string(),
                title: String::new(),
                date: None,
                content: "Khác".to_string(),
            },
        ];

        let out = String::from_utf8(to_csv(&records).unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "url,source,title,date,content");
        assert_eq!(
            lines[1],
            r#"https://cafef.vn/a-1.chn,CafeF,"Giá thép, xi măng tăng",2024-03-01T10:00:00+07:00,Nội dung"#
        );
        assert_eq!(lines[2], "https://vietstock.vn/b-2.htm,Vietstock,,,Khác");
    }

    #[test]
    fn test_empty_input_still_has_header() {
        let out = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(out, "url,source,title,date,content\n");
    }
}
