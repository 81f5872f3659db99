use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Default browser-style user-agent sent with every scrape request.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<bool>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("VELODB_ENV", "development"));
    let bind_addr = parse_addr("VELODB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VELODB_LOG_LEVEL", "info");
    let sites_path = PathBuf::from(or_default("VELODB_SITES_PATH", "./config/sites.yaml"));
    let data_dir = PathBuf::from(or_default("VELODB_DATA_DIR", "./data"));

    let scraper_request_timeout_secs = parse_u64("VELODB_SCRAPER_REQUEST_TIMEOUT_SECS", "10")?;
    let scraper_user_agent = or_default("VELODB_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_retries = parse_u32("VELODB_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_delay_secs = parse_u64("VELODB_SCRAPER_RETRY_DELAY_SECS", "2")?;
    let scraper_page_delay_secs = parse_u64("VELODB_SCRAPER_PAGE_DELAY_SECS", "2")?;
    let scraper_product_delay_secs = parse_u64("VELODB_SCRAPER_PRODUCT_DELAY_SECS", "1")?;
    let scraper_max_listing_pages = parse_usize("VELODB_SCRAPER_MAX_LISTING_PAGES", "10")?;

    let crawl_on_start = parse_bool("VELODB_CRAWL_ON_START", "false")?;
    let crawl_schedule = or_default("VELODB_CRAWL_SCHEDULE", "0 0 0 * * *");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sites_path,
        data_dir,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_delay_secs,
        scraper_page_delay_secs,
        scraper_product_delay_secs,
        scraper_max_listing_pages,
        crawl_on_start,
        crawl_schedule,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
