//! Dated CSV snapshot writing with archive-on-replace.
//!
//! One file per site per run, `current/{site_key}_{YYYYMMDD}.csv`. A run
//! that would overwrite an existing file (a same-day rerun) first moves the
//! old file into `archive/`; snapshots are superseded whole, never merged.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use velodb_core::ProductRecord;

use crate::error::StoreError;

/// Subdirectory holding the snapshots the query layer serves from.
pub const CURRENT_DIR: &str = "current";
/// Subdirectory replaced snapshots are moved into.
pub const ARCHIVE_DIR: &str = "archive";

/// One CSV row of a snapshot: the flat [`ProductRecord`] fields with the
/// image list JSON-encoded into a single column.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SnapshotRow {
    pub website: String,
    pub product_id: String,
    pub language: String,
    pub url: String,
    pub crawl_date: DateTime<Utc>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub battery: Option<String>,
    pub motor_type: Option<String>,
    pub max_speed: Option<String>,
    pub range: Option<String>,
    pub weight: Option<String>,
    pub max_load: Option<String>,
    pub images: String,
}

impl SnapshotRow {
    fn from_record(record: &ProductRecord) -> Result<Self, StoreError> {
        Ok(Self {
            website: record.website.clone(),
            product_id: record.product_id.clone(),
            language: record.language.clone(),
            url: record.url.clone(),
            crawl_date: record.crawl_date,
            name: record.name.clone(),
            price: record.price,
            description: record.description.clone(),
            battery: record.battery.clone(),
            motor_type: record.motor_type.clone(),
            max_speed: record.max_speed.clone(),
            range: record.range.clone(),
            weight: record.weight.clone(),
            max_load: record.max_load.clone(),
            images: serde_json::to_string(&record.images)?,
        })
    }
}

/// Write one site's records to `current/{site_key}_{YYYYMMDD}.csv`, creating
/// the store directories on demand and archiving any same-named previous
/// file first.
///
/// Returns the path written, or `None` when `records` is empty: an empty
/// run writes nothing and leaves any previous snapshot current.
///
/// # Errors
///
/// Returns [`StoreError`] on directory creation, archive rename, or CSV
/// serialization failure.
pub fn write_snapshot(
    data_dir: &Path,
    site_key: &str,
    records: &[ProductRecord],
    date: NaiveDate,
) -> Result<Option<PathBuf>, StoreError> {
    if records.is_empty() {
        tracing::warn!(site = %site_key, "no records to save; keeping previous snapshot");
        return Ok(None);
    }

    let current_dir = data_dir.join(CURRENT_DIR);
    let archive_dir = data_dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&current_dir).map_err(|e| io_error(&current_dir, e))?;
    fs::create_dir_all(&archive_dir).map_err(|e| io_error(&archive_dir, e))?;

    let filename = format!("{site_key}_{}.csv", date.format("%Y%m%d"));
    let path = current_dir.join(&filename);

    if path.exists() {
        let archive_path = archive_dir.join(&filename);
        fs::rename(&path, &archive_path).map_err(|e| io_error(&path, e))?;
        tracing::info!(
            site = %site_key,
            to = %archive_path.display(),
            "archived previous snapshot"
        );
    }

    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(SnapshotRow::from_record(record)?)?;
    }
    writer.flush().map_err(|e| io_error(&path, e))?;

    tracing::info!(site = %site_key, records = records.len(), path = %path.display(), "snapshot saved");
    Ok(Some(path))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(product_id: &str) -> ProductRecord {
        ProductRecord {
            website: "Alpha Bikes".to_string(),
            product_id: product_id.to_string(),
            language: "en-US".to_string(),
            url: format!("https://bikes.example.com/products/{product_id}"),
            crawl_date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            name: Some(format!("Bike {product_id}")),
            price: Some("1299.00".parse().unwrap()),
            description: None,
            battery: Some("48V 15Ah".to_string()),
            motor_type: None,
            max_speed: None,
            range: None,
            weight: None,
            max_load: None,
            images: vec!["https://cdn.example.com/a.jpg".to_string()],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn writes_one_row_per_record_plus_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            "alpha",
            &[record("city-750"), record("trail-1000")],
            date(),
        )
        .unwrap()
        .expect("snapshot path");

        assert_eq!(path.file_name().unwrap(), "alpha_20250601.csv");
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3, "header + 2 rows, got:\n{content}");
        assert!(lines[0].starts_with("website,product_id,language,url,crawl_date"));
        assert!(content.contains("city-750"));
        assert!(content.contains("trail-1000"));
    }

    #[test]
    fn empty_record_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_snapshot(dir.path(), "alpha", &[], date()).unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join(CURRENT_DIR).join("alpha_20250601.csv").exists());
    }

    #[test]
    fn same_day_rerun_archives_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "alpha", &[record("city-750")], date()).unwrap();
        write_snapshot(
            dir.path(),
            "alpha",
            &[record("city-750"), record("trail-1000")],
            date(),
        )
        .unwrap();

        let archived = dir.path().join(ARCHIVE_DIR).join("alpha_20250601.csv");
        assert!(archived.exists(), "previous snapshot should be archived");
        let archived_content = fs::read_to_string(&archived).unwrap();
        assert!(!archived_content.contains("trail-1000"));

        let current = dir.path().join(CURRENT_DIR).join("alpha_20250601.csv");
        let current_content = fs::read_to_string(&current).unwrap();
        assert!(current_content.contains("trail-1000"));
    }

    #[test]
    fn images_column_is_json_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "alpha", &[record("city-750")], date())
            .unwrap()
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(
            content.contains(r#"[""https://cdn.example.com/a.jpg""]"#),
            "images should be a JSON array (CSV-quoted), got:\n{content}"
        );
    }
}
