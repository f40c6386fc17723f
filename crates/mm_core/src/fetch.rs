use async_trait::async_trait;

use crate::types::{ScrapeFailure, ScrapedContent};

pub type ScrapeResult = std::result::Result<ScrapedContent, ScrapeFailure>;

/// Best-effort extraction of readable article text from a URL. Failure is
/// data here, never a crate-level error: one bad URL must not take down a
/// batch.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ScrapeResult;

    /// Fetch every URL independently. Output order matches input order
    /// regardless of completion order.
    async fn fetch_all(&self, urls: &[String]) -> Vec<(String, ScrapeResult)> {
        let mut out = Vec::with_capacity(urls.len());
        for url in urls {
            out.push((url.clone(), self.fetch(url).await));
        }
        out
    }
}
