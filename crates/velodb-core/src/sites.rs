use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Placeholder in `product_url_template` that a product id substitutes into.
pub const PRODUCT_ID_PLACEHOLDER: &str = "{product_id}";

/// How to find product pages on a site: the listing URL, the selector that
/// matches product links on it, and (optionally) the selector for the
/// next-page link. A site without a pagination selector is single-page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub url: String,
    pub product_link_selector: String,
    pub pagination_selector: Option<String>,
}

/// CSS selectors for the product-page fields, all optional. A missing
/// selector means the site never yields that field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSelectors {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub battery: Option<String>,
    pub motor_type: Option<String>,
    pub max_speed: Option<String>,
    pub range: Option<String>,
    pub weight: Option<String>,
    pub max_load: Option<String>,
    pub images: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Stable identifier used in snapshot filenames and bike ids.
    pub key: String,
    /// Human-readable name stored on every record.
    pub name: String,
    pub base_url: String,
    /// URL template with one `{product_id}` placeholder.
    pub product_url_template: String,
    /// Locale tags; the first is the site default and gets no `lang` parameter.
    pub languages: Vec<String>,
    pub discovery: DiscoveryConfig,
    pub selectors: FieldSelectors,
}

impl SiteConfig {
    /// Substitute a product id into the site's product URL template.
    #[must_use]
    pub fn product_url(&self, product_id: &str) -> String {
        self.product_url_template
            .replace(PRODUCT_ID_PLACEHOLDER, product_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteConfig>,
}

/// Load and validate the site registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SitesFileParse)?;

    validate_sites(&sites_file)?;

    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for site in &sites_file.sites {
        if site.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site key must be non-empty".to_string(),
            ));
        }

        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty display name",
                site.key
            )));
        }

        if site.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty base_url",
                site.key
            )));
        }

        if !site.product_url_template.contains(PRODUCT_ID_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "site '{}' product_url_template is missing the {PRODUCT_ID_PLACEHOLDER} placeholder",
                site.key
            )));
        }

        if site.languages.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' must declare at least one language",
                site.key
            )));
        }

        if !seen_keys.insert(site.key.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site key: '{}'",
                site.key
            )));
        }
    }

    Ok(())
}
