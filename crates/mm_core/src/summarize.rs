use async_trait::async_trait;

use crate::types::{SummarizationError, SummaryInput, SummaryMode};

pub type SummaryResult = std::result::Result<String, SummarizationError>;

/// Turns raw text into a concise analytical summary. Implementations wrap an
/// external AI capability; swapping providers must not touch the orchestrator.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize one unit of text under the given prompt profile.
    /// `source_url` feeds the source attribution in article mode.
    async fn summarize(
        &self,
        text: &str,
        mode: SummaryMode,
        source_url: Option<&str>,
    ) -> SummaryResult;

    /// Summarize each item independently; one failure never aborts the batch.
    /// Output order matches input order.
    async fn batch_summarize(&self, items: &[SummaryInput], mode: SummaryMode) -> Vec<SummaryResult> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(
                self.summarize(&item.text, mode, item.source_url.as_deref())
                    .await,
            );
        }
        out
    }
}
