use crate::config::FetchConfig;
use crate::types::{PipelineError, Result};
use backoff::backoff::Backoff;
use backoff::exponential::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// HTTP fetcher for feed endpoints: one shared client, bounded retries with
/// exponential backoff between attempts.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch one feed body as text. Exhausting retries is an error the
    /// caller treats as "this feed contributes nothing this run".
    pub async fn fetch_text(&self, feed_name: &str, url: &str) -> Result<String> {
        Url::parse(url)?;

        debug!("Fetching feed '{}' from {}", feed_name, url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = String::from("no attempts made");

        for attempt in 0..=self.config.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => {
                                info!("Fetched feed '{}' ({} bytes)", feed_name, body.len());
                                return Ok(body);
                            }
                            Err(e) => {
                                last_error = e.to_string();
                            }
                        }
                    } else {
                        last_error = format!(
                            "HTTP {}: {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown")
                        );
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!(
                        "Attempt {} failed for feed '{}' ({}), retrying in {:?}",
                        attempt + 1,
                        feed_name,
                        last_error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(PipelineError::Fetch {
            feed: feed_name.to_string(),
            detail: last_error,
        })
    }

    /// The underlying client, shared with the model client so the whole
    /// process keeps a single connection pool.
    pub fn client(&self) -> Client {
        self.client.clone()
    }
}
