use thiserror::Error;

use crate::types::{DeliveryError, SummarizationError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("this URL was already submitted by {submitted_by}: {url}")]
    DuplicateUrl { url: String, submitted_by: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("nothing to report: no pending articles and no pasted content")]
    EmptyReport,

    #[error("no usable content: every scrape and summarization attempt failed; nothing was sent")]
    NoUsableContent,

    #[error("a report run is already in progress, retry shortly")]
    ReportInProgress,

    #[error("report run exceeded its {0}s budget; nothing was sent or archived")]
    RunTimeout(u64),

    #[error("summarization failed: {0}")]
    Summarization(#[from] SummarizationError),

    #[error("delivery failed: {0}; nothing was archived, safe to retry")]
    Delivery(#[from] DeliveryError),

    #[error("report was delivered but archiving is inconsistent: {0}; review before resending")]
    ArchiveInconsistent(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("external error: {0}")]
    External(#[from] anyhow::Error),
}
