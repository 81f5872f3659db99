//! HTTP fetch with a flat-rate retry policy.
//!
//! One GET per attempt with a fixed user-agent and per-request timeout.
//! A non-2xx status or transport error counts as a failed attempt; attempts
//! are separated by a fixed delay and the last error surfaces once all
//! attempts are spent. No exponential backoff and no per-status special
//! cases: every failure is retried the same way.

use std::time::Duration;

use reqwest::Client;

use velodb_core::AppConfig;

use crate::error::ScraperError;

pub struct PageClient {
    client: Client,
    /// Total attempts per URL, including the first. Always at least 1.
    max_attempts: u32,
    retry_delay: Duration,
}

impl PageClient {
    /// Creates a `PageClient` with the configured timeout, user-agent, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.scraper_request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.scraper_user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            max_attempts: config.scraper_max_retries.max(1),
            retry_delay: Duration::from_secs(config.scraper_retry_delay_secs),
        })
    }

    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once all attempts are exhausted:
    /// [`ScraperError::UnexpectedStatus`] for a non-2xx response, or
    /// [`ScraperError::Http`] for a transport failure.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.max_attempts => {
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "fetch attempt failed; retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        url,
                        attempts = self.max_attempts,
                        error = %err,
                        "fetch failed after all attempts"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, ScraperError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}
