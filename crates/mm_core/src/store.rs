use async_trait::async_trait;

use crate::types::{ArchivedArticle, HansardQuestionRecord, PendingArticle};
use crate::{Error, Result};

/// Deduplicated persistence of submissions and the processed archive.
/// The store is the sole writer of durable state.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new pending article. Fails with [`Error::DuplicateUrl`] if
    /// the normalized URL already exists in pending or archive.
    async fn submit(&self, url: &str, submitted_by: &str) -> Result<PendingArticle>;

    /// All pending articles, oldest submission first.
    async fn list_pending(&self) -> Result<Vec<PendingArticle>>;

    /// Attach operator-pasted text to a pending article.
    async fn set_pasted_text(&self, id: i64, text: &str) -> Result<PendingArticle>;

    /// Drop a pending article without archiving it.
    async fn remove(&self, id: i64) -> Result<()>;

    /// Atomically move the given pending rows into the archive. All-or-nothing:
    /// if any id is no longer pending the whole step fails with
    /// [`Error::NotFound`] and no row moves.
    async fn archive(&self, ids: &[i64]) -> Result<Vec<ArchivedArticle>>;

    async fn list_archive(&self) -> Result<Vec<ArchivedArticle>>;

    /// Persist a generated batch of parliamentary questions.
    async fn record_hansard_questions(
        &self,
        question_text: &str,
        category: &str,
        source_ids: &[i64],
    ) -> Result<()>;

    /// Most recent question batches, newest first.
    async fn recent_hansard_questions(&self, limit: usize) -> Result<Vec<HansardQuestionRecord>>;

    /// Liveness probe for monitoring.
    async fn health(&self) -> Result<()>;
}

/// Trim whitespace and require an absolute http(s) URL. Returns the trimmed
/// form used for the uniqueness check.
pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".to_string()));
    }
    let parsed =
        url::Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(Error::InvalidUrl(format!(
            "unsupported scheme '{other}' in {trimmed}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_whitespace() {
        let url = normalize_url("  https://example.com/a \n").unwrap();
        assert_eq!(url, "https://example.com/a");
    }

    #[test]
    fn normalize_rejects_non_http_schemes() {
        assert!(normalize_url("ftp://example.com").is_err());
        assert!(normalize_url("javascript:alert(1)").is_err());
        assert!(normalize_url("not-a-url").is_err());
        assert!(normalize_url("").is_err());
    }
}
