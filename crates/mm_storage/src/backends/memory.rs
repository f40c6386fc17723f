use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use mm_core::{
    normalize_url, ArchivedArticle, ArticleStore, Error, HansardQuestionRecord, PendingArticle,
    Result,
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    next_question_id: i64,
    pending: Vec<PendingArticle>,
    archive: Vec<ArchivedArticle>,
    questions: Vec<HansardQuestionRecord>,
}

/// In-memory store with the same semantics as the sqlite backend. Used by
/// orchestrator and web tests, and for throwaway local runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn submit(&self, url: &str, submitted_by: &str) -> Result<PendingArticle> {
        let url = normalize_url(url)?;
        let mut inner = self.inner.write().await;

        let prior = inner
            .pending
            .iter()
            .find(|a| a.url == url)
            .map(|a| a.submitted_by.clone())
            .or_else(|| {
                inner
                    .archive
                    .iter()
                    .find(|a| a.url == url)
                    .map(|a| a.submitted_by.clone())
            });
        if let Some(submitted_by) = prior {
            return Err(Error::DuplicateUrl { url, submitted_by });
        }

        inner.next_id += 1;
        let article = PendingArticle {
            id: inner.next_id,
            url,
            submitted_by: submitted_by.to_string(),
            submitted_at: Utc::now(),
            pasted_text: None,
        };
        inner.pending.push(article.clone());
        Ok(article)
    }

    async fn list_pending(&self) -> Result<Vec<PendingArticle>> {
        let inner = self.inner.read().await;
        let mut pending = inner.pending.clone();
        pending.sort_by(|a, b| (a.submitted_at, a.id).cmp(&(b.submitted_at, b.id)));
        Ok(pending)
    }

    async fn set_pasted_text(&self, id: i64, text: &str) -> Result<PendingArticle> {
        let mut inner = self.inner.write().await;
        let article = inner
            .pending
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("pending article {id}")))?;
        article.pasted_text = Some(text.trim().to_string());
        Ok(article.clone())
    }

    async fn remove(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        let before = inner.pending.len();
        inner.pending.retain(|a| a.id != id);
        if inner.pending.len() == before {
            return Err(Error::NotFound(format!("pending article {id}")));
        }
        Ok(())
    }

    async fn archive(&self, ids: &[i64]) -> Result<Vec<ArchivedArticle>> {
        let mut inner = self.inner.write().await;

        // Verify the whole batch before moving anything.
        for &id in ids {
            if !inner.pending.iter().any(|a| a.id == id) {
                return Err(Error::NotFound(format!("article {id} is no longer pending")));
            }
        }

        let now = Utc::now();
        let mut archived = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(pos) = inner.pending.iter().position(|a| a.id == id) else {
                return Err(Error::NotFound(format!("article {id} is no longer pending")));
            };
            let pending = inner.pending.remove(pos);
            let record = ArchivedArticle {
                id: pending.id,
                url: pending.url,
                submitted_by: pending.submitted_by,
                original_submitted_at: pending.submitted_at,
                processed_at: now,
            };
            inner.archive.push(record.clone());
            archived.push(record);
        }
        Ok(archived)
    }

    async fn list_archive(&self) -> Result<Vec<ArchivedArticle>> {
        Ok(self.inner.read().await.archive.clone())
    }

    async fn record_hansard_questions(
        &self,
        question_text: &str,
        category: &str,
        source_ids: &[i64],
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.next_question_id += 1;
        let record = HansardQuestionRecord {
            id: inner.next_question_id,
            question_text: question_text.to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
            source_article_ids: source_ids.to_vec(),
        };
        inner.questions.push(record);
        Ok(())
    }

    async fn recent_hansard_questions(&self, limit: usize) -> Result<Vec<HansardQuestionRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.questions.iter().rev().take(limit).cloned().collect())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_submission_leaves_existing_row_unchanged() {
        let store = MemoryStore::new();
        store.submit("https://a.example/1", "Alice").await.unwrap();

        let err = store
            .submit("https://a.example/1", "Bob")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUrl { .. }));
        assert!(err.to_string().contains("Alice"));

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].submitted_by, "Alice");
    }

    #[tokio::test]
    async fn archive_rejects_stale_ids_without_partial_moves() {
        let store = MemoryStore::new();
        let a = store.submit("https://a.example/1", "Alice").await.unwrap();

        let err = store.archive(&[a.id, a.id + 1]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
        assert!(store.list_archive().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn archived_urls_stay_deduplicated() {
        let store = MemoryStore::new();
        let a = store.submit("https://a.example/1", "Alice").await.unwrap();
        store.archive(&[a.id]).await.unwrap();

        let err = store
            .submit("https://a.example/1", "Bob")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUrl { .. }));
    }
}
