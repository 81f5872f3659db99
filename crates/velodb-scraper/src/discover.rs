//! Listing-page discovery: walk pagination links, collect product ids.

use std::collections::BTreeSet;
use std::time::Duration;

use scraper::Html;

use velodb_core::SiteConfig;

use crate::client::PageClient;
use crate::error::ScraperError;
use crate::extract::extract_product_id;
use crate::parse::parse_selector;

/// Crawl a site's listing pages and return the deduplicated set of product
/// ids found on them.
///
/// Starts at the configured listing URL, collects product-link `href`s,
/// resolves relative ones against the site's base URL, and derives a product
/// id from each. Follows the pagination selector's link until it is absent,
/// a fetch fails, or `max_pages` pages have been visited; `page_delay`
/// bounds the request rate between pages. A page with zero product links is
/// not an error, and a site without a pagination selector is single-page.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] when a configured selector does
/// not compile. Fetch failures stop the walk but the ids collected so far
/// are still returned.
pub async fn discover(
    client: &PageClient,
    site: &SiteConfig,
    max_pages: usize,
    page_delay: Duration,
) -> Result<BTreeSet<String>, ScraperError> {
    let product_link_selector = parse_selector(&site.discovery.product_link_selector)?;
    let pagination_selector = site
        .discovery
        .pagination_selector
        .as_deref()
        .map(parse_selector)
        .transpose()?;

    let mut product_ids = BTreeSet::new();
    let mut current_url = site.discovery.url.clone();
    let mut pages_crawled = 0usize;

    tracing::info!(site = %site.key, url = %current_url, "starting product discovery");

    while pages_crawled < max_pages {
        tracing::debug!(site = %site.key, url = %current_url, "crawling listing page");

        let body = match client.fetch_page(&current_url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    site = %site.key,
                    url = %current_url,
                    error = %e,
                    "listing page fetch failed; stopping discovery"
                );
                break;
            }
        };

        // `Html` is not `Send`; keep the document scoped so it never lives
        // across an await point.
        let (hrefs, next_page) = {
            let doc = Html::parse_document(&body);
            let hrefs: Vec<String> = doc
                .select(&product_link_selector)
                .filter_map(|el| el.value().attr("href"))
                .map(str::to_owned)
                .collect();
            let next_page = pagination_selector.as_ref().and_then(|sel| {
                doc.select(sel)
                    .next()
                    .and_then(|el| el.value().attr("href"))
                    .map(str::to_owned)
            });
            (hrefs, next_page)
        };

        tracing::debug!(site = %site.key, links = hrefs.len(), "listing page scanned");

        for href in hrefs {
            let absolute = resolve_href(&href, &site.base_url);
            match extract_product_id(&absolute, &site.base_url, &site.product_url_template) {
                Some(id) => {
                    product_ids.insert(id);
                }
                None => {
                    tracing::warn!(site = %site.key, href = %absolute, "link yielded no product id");
                }
            }
        }

        pages_crawled += 1;

        match next_page {
            Some(href) => current_url = resolve_href(&href, &site.base_url),
            None => break,
        }

        tokio::time::sleep(page_delay).await;
    }

    tracing::info!(
        site = %site.key,
        count = product_ids.len(),
        pages = pages_crawled,
        "discovery complete"
    );
    Ok(product_ids)
}

/// Resolve a possibly-relative `href` against the site's base URL.
pub(crate) fn resolve_href(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match reqwest::Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}
