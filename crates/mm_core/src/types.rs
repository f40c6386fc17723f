use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A submitted URL waiting to be included in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingArticle {
    pub id: i64,
    pub url: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    /// Operator-pasted article text for paywalled sources. When present,
    /// the report run uses it instead of scraping the URL.
    pub pasted_text: Option<String>,
}

impl PendingArticle {
    pub fn has_content(&self) -> bool {
        self.pasted_text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

/// The durable record of an article already covered by a delivered report.
/// Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedArticle {
    pub id: i64,
    pub url: String,
    pub submitted_by: String,
    pub original_submitted_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

/// Readable text pulled out of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Why a fetch produced no usable text. Per-item data, never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeFailure {
    #[error("request timed out")]
    Timeout,
    #[error("http error: {0}")]
    HttpStatus(u16),
    #[error("no readable text found on the page")]
    ParseEmpty,
    #[error("unreachable: {0}")]
    Unreachable(String),
}

/// Prompt profile selector for the Summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryMode {
    /// One neutral paragraph per source, linked back to the outlet.
    ArticleSummary,
    /// Executive synthesis over a batch of per-item summaries.
    ReportSynthesis,
    /// Parliamentary-question-style output over a media corpus.
    HansardQuestions,
}

/// One text unit handed to the Summarizer.
#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub text: String,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizationError {
    #[error("rate limit or quota exceeded")]
    RateLimited,
    #[error("summarization service unavailable")]
    ServiceUnavailable,
    #[error("authentication failed, check the API key")]
    AuthFailed,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no content provided")]
    EmptyInput,
}

impl SummarizationError {
    /// Transient causes are safe to retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServiceUnavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("remote rejected the payload with status {0}")]
    Rejected(u16),
    #[error("delivery timed out")]
    Timeout,
}

/// A rendered report ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub subject: String,
    pub html: String,
}

/// Per-run counters surfaced to the triggering operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub scraped_ok: usize,
    pub scrape_failed: usize,
    pub summarized_ok: usize,
    pub summarize_failed: usize,
    pub archived: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub report_id: String,
    pub stats: RunStats,
}

/// A persisted batch of generated parliamentary questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HansardQuestionRecord {
    pub id: i64,
    pub question_text: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub source_article_ids: Vec<i64>,
}
