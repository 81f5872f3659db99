//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring crawl job.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use velodb_core::{AppConfig, SitesFile};

/// Builds and starts the background job scheduler.
///
/// Registers the recurring crawl job and starts the scheduler. Returns the
/// running [`JobScheduler`] handle, which must be kept alive for the
/// lifetime of the process — dropping it shuts down all jobs. When
/// `crawl_on_start` is set, one crawl run is additionally spawned right away.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// configured cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    config: Arc<AppConfig>,
    sites: Arc<SitesFile>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_crawl_job(&scheduler, Arc::clone(&config), Arc::clone(&sites)).await?;

    scheduler.start().await?;

    if config.crawl_on_start {
        tokio::spawn(async move {
            tracing::info!("scheduler: running startup crawl");
            velodb_scraper::run_pipeline(&config, &sites).await;
        });
    }

    Ok(scheduler)
}

/// Register the recurring crawl job at the configured cron schedule, daily
/// at midnight UTC by default. Each firing crawls every configured site and
/// writes one snapshot per site; per-site failures are logged inside the
/// pipeline and do not stop the remaining sites.
///
/// There is no overlap guard: a manual CLI run coinciding with a scheduled
/// firing would race on the snapshot directory. Runs are assumed to be far
/// enough apart that this does not occur.
async fn register_crawl_job(
    scheduler: &JobScheduler,
    config: Arc<AppConfig>,
    sites: Arc<SitesFile>,
) -> Result<(), JobSchedulerError> {
    let schedule = config.crawl_schedule.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let config = Arc::clone(&config);
        let sites = Arc::clone(&sites);

        Box::pin(async move {
            tracing::info!("scheduler: starting crawl run");
            let summary = velodb_scraper::run_pipeline(&config, &sites).await;
            tracing::info!(
                ok = summary.sites_ok,
                failed = summary.sites_failed,
                records = summary.records,
                "scheduler: crawl run complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
