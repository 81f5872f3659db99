use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sites_path: PathBuf,
    /// Root of the snapshot store; `current/` and `archive/` live below it.
    pub data_dir: PathBuf,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Total attempts per URL, including the first.
    pub scraper_max_retries: u32,
    /// Flat delay between attempts on the same URL.
    pub scraper_retry_delay_secs: u64,
    /// Politeness pause between listing pages during discovery.
    pub scraper_page_delay_secs: u64,
    /// Politeness pause between product page fetches.
    pub scraper_product_delay_secs: u64,
    /// Pagination ceiling per listing crawl.
    pub scraper_max_listing_pages: usize,
    /// Run a crawl once at server startup in addition to the schedule.
    pub crawl_on_start: bool,
    /// Six-field cron expression for the recurring crawl job.
    pub crawl_schedule: String,
}
