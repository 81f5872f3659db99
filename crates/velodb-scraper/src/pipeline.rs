//! Whole-run orchestration: crawl every configured site and write one
//! snapshot per site.
//!
//! Both the CLI and the server's scheduled job drive runs through this
//! module, so there is exactly one copy of the run loop. Sites are processed
//! strictly sequentially; one site's failure is logged and does not stop the
//! others.

use chrono::Utc;
use thiserror::Error;

use velodb_core::{AppConfig, SiteConfig, SitesFile};
use velodb_store::{write_snapshot, StoreError};

use crate::client::PageClient;
use crate::crawl::crawl_site;
use crate::error::ScraperError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scrape(#[from] ScraperError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Totals for one pipeline run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub sites_ok: usize,
    pub sites_failed: usize,
    pub records: usize,
}

/// Crawl every site in the registry and snapshot the results.
pub async fn run_pipeline(config: &AppConfig, sites: &SitesFile) -> RunSummary {
    tracing::info!(sites = sites.sites.len(), "starting crawler run");

    let client = match PageClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client; aborting run");
            return RunSummary {
                sites_failed: sites.sites.len(),
                ..RunSummary::default()
            };
        }
    };

    let mut summary = RunSummary::default();
    for site in &sites.sites {
        match crawl_and_store(&client, config, site).await {
            Ok(count) => {
                summary.sites_ok += 1;
                summary.records += count;
            }
            Err(e) => {
                tracing::error!(site = %site.key, error = %e, "site crawl failed");
                summary.sites_failed += 1;
            }
        }
    }

    tracing::info!(
        ok = summary.sites_ok,
        failed = summary.sites_failed,
        records = summary.records,
        "crawler run complete"
    );
    summary
}

async fn crawl_and_store(
    client: &PageClient,
    config: &AppConfig,
    site: &SiteConfig,
) -> Result<usize, PipelineError> {
    let records = crawl_site(client, config, site).await?;

    match write_snapshot(
        &config.data_dir,
        &site.key,
        &records,
        Utc::now().date_naive(),
    )? {
        Some(path) => {
            tracing::info!(
                site = %site.key,
                records = records.len(),
                path = %path.display(),
                "snapshot written"
            );
        }
        None => {
            tracing::warn!(site = %site.key, "site contributed zero records this run");
        }
    }

    Ok(records.len())
}
