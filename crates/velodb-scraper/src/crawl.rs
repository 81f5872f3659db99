//! Per-site crawl: discovery followed by product-page extraction.

use std::time::Duration;

use chrono::Utc;
use scraper::Html;

use velodb_core::{AppConfig, ProductRecord, SiteConfig};

use crate::client::PageClient;
use crate::discover::discover;
use crate::error::ScraperError;
use crate::parse::{parse_product_page, PageSelectors, ParsedProduct};

/// Crawl one site: discover product ids, then fetch and parse every product
/// page for every configured language.
///
/// A product page that still fails after retries is skipped with a warning;
/// the rest of the site proceeds. An empty discovery result yields an empty
/// record list, not an error.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] when the site's configured
/// selectors do not compile.
pub async fn crawl_site(
    client: &PageClient,
    config: &AppConfig,
    site: &SiteConfig,
) -> Result<Vec<ProductRecord>, ScraperError> {
    tracing::info!(site = %site.key, "starting crawl");

    let selectors = PageSelectors::compile(&site.selectors)?;
    let product_ids = discover(
        client,
        site,
        config.scraper_max_listing_pages,
        Duration::from_secs(config.scraper_page_delay_secs),
    )
    .await?;

    if product_ids.is_empty() {
        tracing::warn!(site = %site.key, "no product ids discovered");
        return Ok(Vec::new());
    }

    let product_delay = Duration::from_secs(config.scraper_product_delay_secs);
    let mut records = Vec::new();

    for product_id in &product_ids {
        for language in &site.languages {
            let url = localized_product_url(site, product_id, language);
            tracing::info!(site = %site.key, url = %url, "crawling product page");

            let body = match client.fetch_page(&url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        site = %site.key,
                        url = %url,
                        error = %e,
                        "product page fetch failed; skipping"
                    );
                    continue;
                }
            };

            let parsed = {
                let doc = Html::parse_document(&body);
                parse_product_page(&doc, &selectors)
            };

            records.push(into_record(site, product_id, language, url, parsed));

            tokio::time::sleep(product_delay).await;
        }
    }

    tracing::info!(site = %site.key, records = records.len(), "crawl complete");
    Ok(records)
}

/// Product URL for one id and language. The first configured language is the
/// site default and gets no parameter; other languages append `lang=<tag>`
/// with `?` or `&` depending on whether the URL already has a query.
fn localized_product_url(site: &SiteConfig, product_id: &str, language: &str) -> String {
    let mut url = site.product_url(product_id);
    if site
        .languages
        .first()
        .is_some_and(|default| default.as_str() != language)
    {
        if url.contains('?') {
            url.push_str(&format!("&lang={language}"));
        } else {
            url.push_str(&format!("?lang={language}"));
        }
    }
    url
}

fn into_record(
    site: &SiteConfig,
    product_id: &str,
    language: &str,
    url: String,
    parsed: ParsedProduct,
) -> ProductRecord {
    ProductRecord {
        website: site.name.clone(),
        product_id: product_id.to_string(),
        language: language.to_string(),
        url,
        crawl_date: Utc::now(),
        name: parsed.name,
        price: parsed.price,
        description: parsed.description,
        battery: parsed.battery,
        motor_type: parsed.motor_type,
        max_speed: parsed.max_speed,
        range: parsed.range,
        weight: parsed.weight,
        max_load: parsed.max_load,
        images: parsed.images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velodb_core::sites::{DiscoveryConfig, FieldSelectors};

    fn site_with_languages(languages: &[&str]) -> SiteConfig {
        SiteConfig {
            key: "alpha".to_string(),
            name: "Alpha Bikes".to_string(),
            base_url: "https://bikes.example.com".to_string(),
            product_url_template: "https://bikes.example.com/products/{product_id}".to_string(),
            languages: languages.iter().map(ToString::to_string).collect(),
            discovery: DiscoveryConfig {
                url: "https://bikes.example.com/collections/all".to_string(),
                product_link_selector: "a.product-link".to_string(),
                pagination_selector: None,
            },
            selectors: FieldSelectors::default(),
        }
    }

    #[test]
    fn default_language_gets_no_parameter() {
        let site = site_with_languages(&["en-US", "de-DE"]);
        assert_eq!(
            localized_product_url(&site, "city-750", "en-US"),
            "https://bikes.example.com/products/city-750"
        );
    }

    #[test]
    fn non_default_language_appends_query() {
        let site = site_with_languages(&["en-US", "de-DE"]);
        assert_eq!(
            localized_product_url(&site, "city-750", "de-DE"),
            "https://bikes.example.com/products/city-750?lang=de-DE"
        );
    }

    #[test]
    fn non_default_language_appends_with_ampersand_when_query_present() {
        let mut site = site_with_languages(&["en-US", "de-DE"]);
        site.product_url_template =
            "https://bikes.example.com/products/{product_id}?view=full".to_string();
        assert_eq!(
            localized_product_url(&site, "city-750", "de-DE"),
            "https://bikes.example.com/products/city-750?view=full&lang=de-DE"
        );
    }
}
