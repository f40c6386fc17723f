use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::debug;

use mm_core::{AppConfig, ContentFetcher, Result, ScrapeFailure, ScrapeResult};

pub mod extract;

pub mod prelude {
    pub use super::HttpFetcher;
    pub use mm_core::{ContentFetcher, ScrapeFailure, ScrapedContent};
}

/// HTTP implementation of [`ContentFetcher`]. Follows redirects, bounds
/// every request with a timeout, and never surfaces network or parse
/// problems as crate-level errors.
pub struct HttpFetcher {
    client: Client,
    worker_cap: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str, worker_cap: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            worker_cap: worker_cap.max(1),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.scrape_timeout, &config.user_agent, config.worker_cap)
    }
}

fn classify_request_error(e: reqwest::Error) -> ScrapeFailure {
    if e.is_timeout() {
        ScrapeFailure::Timeout
    } else {
        ScrapeFailure::Unreachable(e.to_string())
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> ScrapeResult {
        debug!("fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeFailure::HttpStatus(status.as_u16()));
        }

        let html = response.text().await.map_err(classify_request_error)?;
        extract::readable_text(url, &html).ok_or(ScrapeFailure::ParseEmpty)
    }

    async fn fetch_all(&self, urls: &[String]) -> Vec<(String, ScrapeResult)> {
        // `buffered` caps in-flight requests and keeps input order, so one
        // slow or failing URL never blocks or reorders the rest.
        stream::iter(urls.to_vec())
            .map(|url| async move {
                let result = self.fetch(&url).await;
                (url, result)
            })
            .buffered(self.worker_cap)
            .collect()
            .await
    }
}
