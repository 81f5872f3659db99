//! `velodb crawl`: run the crawl-and-snapshot pipeline once.

use anyhow::Context;

use velodb_core::SitesFile;

/// Run the pipeline for every configured site, or for one site when a
/// filter is given. Per-site failures are logged inside the pipeline and do
/// not fail the command; only configuration problems (or an unknown site
/// key) exit non-zero.
pub(crate) async fn run(site_filter: Option<&str>) -> anyhow::Result<()> {
    let config = velodb_core::load_app_config()?;
    let registry = velodb_core::load_sites(&config.sites_path)
        .with_context(|| format!("loading site registry from {}", config.sites_path.display()))?;

    let sites = match site_filter {
        Some(key) => {
            let selected: Vec<_> = registry
                .sites
                .iter()
                .filter(|s| s.key == key)
                .cloned()
                .collect();
            anyhow::ensure!(
                !selected.is_empty(),
                "site '{key}' is not configured; run `velodb sites` to list known keys"
            );
            SitesFile { sites: selected }
        }
        None => registry,
    };

    let summary = velodb_scraper::run_pipeline(&config, &sites).await;

    println!(
        "crawl complete: {} site(s) ok, {} failed, {} record(s)",
        summary.sites_ok, summary.sites_failed, summary.records
    );
    Ok(())
}
