use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product listing as extracted from a site during a single crawl run.
///
/// Records are immutable once created: a run produces one record per
/// (site, product id, language) and the next run's snapshot supersedes the
/// whole set. Fields the site's markup did not yield stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Display name of the source site (e.g. "Engwe US").
    pub website: String,
    /// Site-relative product id; may contain `/`.
    pub product_id: String,
    /// Locale tag the page was fetched under.
    pub language: String,
    /// URL the record was extracted from.
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
    /// Image URLs in page order, deduplicated.
    pub images: Vec<String>,
}

/// Build the synthetic external id addressing one record:
/// `{site_key}_{product_id}_{language}`.
///
/// Site keys may themselves contain underscores and product ids may contain
/// `/`, so the id is not reversibly splittable; lookups must compare against
/// ids reconstructed from rows rather than parse the requested string.
#[must_use]
pub fn bike_id(site_key: &str, product_id: &str, language: &str) -> String {
    format!("{site_key}_{product_id}_{language}")
}
