//! Query-layer view over the current snapshot directory.
//!
//! Every call re-reads the directory in full; there is no cache across
//! calls. That holds up because both the request volume and the snapshot
//! sizes are small.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use velodb_core::bike_id;

use crate::error::StoreError;
use crate::snapshot::{SnapshotRow, CURRENT_DIR};

/// External, denormalized representation of one product record, addressed by
/// its synthetic id.
#[derive(Debug, Clone, Serialize)]
pub struct Bike {
    /// `{site_key}_{product_id}_{language}`.
    pub id: String,
    pub website_key: String,
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
    pub images: Option<Vec<String>>,
}

impl Bike {
    fn from_row(site_key: &str, row: SnapshotRow) -> Self {
        // Unparseable image data is treated as absent rather than failing
        // the whole row.
        let images = serde_json::from_str::<Vec<String>>(&row.images).ok();
        Self {
            id: bike_id(site_key, &row.product_id, &row.language),
            website_key: site_key.to_string(),
            website: row.website,
            product_id: row.product_id,
            language: row.language,
            url: row.url,
            crawl_date: row.crawl_date,
            name: row.name,
            price: row.price,
            description: row.description,
            battery: row.battery,
            motor_type: row.motor_type,
            max_speed: row.max_speed,
            range: row.range,
            weight: row.weight,
            max_load: row.max_load,
            images,
        }
    }
}

/// Load every bike from the current snapshots.
///
/// The site key is the filename minus its trailing `_YYYYMMDD` part; when
/// several files share a site key only the newest-dated one is read (the
/// date suffix makes lexicographic order chronological). A file that fails
/// to parse is logged and skipped, not fatal. A missing `current/`
/// directory yields an empty list.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the current directory cannot be listed.
pub fn load_bikes(data_dir: &Path) -> Result<Vec<Bike>, StoreError> {
    let current_dir = data_dir.join(CURRENT_DIR);
    if !current_dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&current_dir).map_err(|e| StoreError::Io {
        path: current_dir.display().to_string(),
        source: e,
    })?;

    let mut newest: BTreeMap<String, PathBuf> = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::Io {
            path: current_dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let key = site_key_from_stem(stem).to_string();
        match newest.get(&key) {
            Some(existing) if existing.file_name() >= path.file_name() => {}
            _ => {
                newest.insert(key, path);
            }
        }
    }

    let mut bikes = Vec::new();
    for (site_key, path) in &newest {
        match read_snapshot(site_key, path) {
            Ok(mut rows) => bikes.append(&mut rows),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
            }
        }
    }

    tracing::debug!(
        bikes = bikes.len(),
        files = newest.len(),
        "loaded current snapshots"
    );
    Ok(bikes)
}

/// Bikes whose reconstructed id equals one of `ids`, in request order.
/// Unknown ids are silently omitted.
///
/// Ids are matched against the id rebuilt from each row, never by splitting
/// the requested string: site keys contain underscores and product ids may
/// contain `/`, so the compound id is not reversibly splittable.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the current directory cannot be listed.
pub fn find_bikes(data_dir: &Path, ids: &[String]) -> Result<Vec<Bike>, StoreError> {
    let all = load_bikes(data_dir)?;
    let mut matches = Vec::new();
    for id in ids {
        if let Some(bike) = all.iter().find(|b| &b.id == id) {
            matches.push(bike.clone());
        }
    }
    Ok(matches)
}

fn read_snapshot(site_key: &str, path: &Path) -> Result<Vec<Bike>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bikes = Vec::new();
    for row in reader.deserialize::<SnapshotRow>() {
        bikes.push(Bike::from_row(site_key, row?));
    }
    Ok(bikes)
}

/// Filename stem minus the trailing `_YYYYMMDD` date part. Site keys may
/// themselves contain underscores (`engwe_us_20250601` → `engwe_us`).
fn site_key_from_stem(stem: &str) -> &str {
    stem.rsplit_once('_').map_or(stem, |(key, _)| key)
}
