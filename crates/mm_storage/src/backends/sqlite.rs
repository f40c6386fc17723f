use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use mm_core::{
    normalize_url, ArchivedArticle, ArticleStore, Error, HansardQuestionRecord, PendingArticle,
    Result,
};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS pending_articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        submitted_by TEXT NOT NULL,
        submitted_at TEXT NOT NULL,
        pasted_text TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS processed_archive (
        id INTEGER PRIMARY KEY,
        url TEXT NOT NULL UNIQUE,
        submitted_by TEXT NOT NULL,
        original_submitted_at TEXT NOT NULL,
        processed_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS hansard_questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_text TEXT NOT NULL,
        category TEXT NOT NULL,
        created_at TEXT NOT NULL,
        source_article_ids TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStore {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("failed to parse timestamp '{raw}': {e}")))
}

fn row_to_pending(row: &SqliteRow) -> Result<PendingArticle> {
    Ok(PendingArticle {
        id: row.get("id"),
        url: row.get("url"),
        submitted_by: row.get("submitted_by"),
        submitted_at: parse_timestamp(&row.get::<String, _>("submitted_at"))?,
        pasted_text: row.get("pasted_text"),
    })
}

fn row_to_archived(row: &SqliteRow) -> Result<ArchivedArticle> {
    Ok(ArchivedArticle {
        id: row.get("id"),
        url: row.get("url"),
        submitted_by: row.get("submitted_by"),
        original_submitted_at: parse_timestamp(&row.get::<String, _>("original_submitted_at"))?,
        processed_at: parse_timestamp(&row.get::<String, _>("processed_at"))?,
    })
}

impl SqliteStore {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.map_err(db_err)?;
        Self::migrate(&pool).await?;
        info!("sqlite store ready at {}", path.as_ref().display());
        Ok(Self { pool })
    }

    /// Private in-memory database, mainly for tests. A single connection so
    /// every query sees the same database.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(pool)
                .await
                .map_err(|e| Error::Database(format!("migration {i} failed: {e}")))?;
        }
        Ok(())
    }

    async fn find_duplicate(&self, url: &str) -> Result<Option<String>> {
        let pending = sqlx::query("SELECT submitted_by FROM pending_articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        if let Some(row) = pending {
            return Ok(Some(row.get("submitted_by")));
        }
        let archived = sqlx::query("SELECT submitted_by FROM processed_archive WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(archived.map(|row| row.get("submitted_by")))
    }
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn submit(&self, url: &str, submitted_by: &str) -> Result<PendingArticle> {
        let url = normalize_url(url)?;
        if let Some(prior) = self.find_duplicate(&url).await? {
            return Err(Error::DuplicateUrl {
                url,
                submitted_by: prior,
            });
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO pending_articles (url, submitted_by, submitted_at) VALUES (?, ?, ?)",
        )
        .bind(&url)
        .bind(submitted_by)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(r) => r,
            // The UNIQUE constraint backstops the race between check and insert.
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                let prior = self
                    .find_duplicate(&url)
                    .await?
                    .unwrap_or_else(|| "another submitter".to_string());
                return Err(Error::DuplicateUrl {
                    url,
                    submitted_by: prior,
                });
            }
            Err(e) => return Err(db_err(e)),
        };

        Ok(PendingArticle {
            id: result.last_insert_rowid(),
            url,
            submitted_by: submitted_by.to_string(),
            submitted_at: now,
            pasted_text: None,
        })
    }

    async fn list_pending(&self) -> Result<Vec<PendingArticle>> {
        let rows = sqlx::query(
            "SELECT id, url, submitted_by, submitted_at, pasted_text
             FROM pending_articles ORDER BY submitted_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_pending).collect()
    }

    async fn set_pasted_text(&self, id: i64, text: &str) -> Result<PendingArticle> {
        let result = sqlx::query("UPDATE pending_articles SET pasted_text = ? WHERE id = ?")
            .bind(text.trim())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("pending article {id}")));
        }
        let row = sqlx::query(
            "SELECT id, url, submitted_by, submitted_at, pasted_text
             FROM pending_articles WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row_to_pending(&row)
    }

    async fn remove(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM pending_articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("pending article {id}")));
        }
        Ok(())
    }

    async fn archive(&self, ids: &[i64]) -> Result<Vec<ArchivedArticle>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let now = Utc::now();
        let mut archived = Vec::with_capacity(ids.len());

        for &id in ids {
            let row = sqlx::query(
                "SELECT id, url, submitted_by, submitted_at, pasted_text
                 FROM pending_articles WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

            // Dropping the transaction rolls back everything moved so far.
            let Some(row) = row else {
                return Err(Error::NotFound(format!("article {id} is no longer pending")));
            };
            let pending = row_to_pending(&row)?;

            sqlx::query(
                "INSERT INTO processed_archive
                 (id, url, submitted_by, original_submitted_at, processed_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(pending.id)
            .bind(&pending.url)
            .bind(&pending.submitted_by)
            .bind(pending.submitted_at.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            sqlx::query("DELETE FROM pending_articles WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;

            archived.push(ArchivedArticle {
                id: pending.id,
                url: pending.url,
                submitted_by: pending.submitted_by,
                original_submitted_at: pending.submitted_at,
                processed_at: now,
            });
        }

        tx.commit().await.map_err(db_err)?;
        Ok(archived)
    }

    async fn list_archive(&self) -> Result<Vec<ArchivedArticle>> {
        let rows = sqlx::query(
            "SELECT id, url, submitted_by, original_submitted_at, processed_at
             FROM processed_archive ORDER BY processed_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_archived).collect()
    }

    async fn record_hansard_questions(
        &self,
        question_text: &str,
        category: &str,
        source_ids: &[i64],
    ) -> Result<()> {
        let sources = serde_json::to_string(source_ids)?;
        sqlx::query(
            "INSERT INTO hansard_questions (question_text, category, created_at, source_article_ids)
             VALUES (?, ?, ?, ?)",
        )
        .bind(question_text)
        .bind(category)
        .bind(Utc::now().to_rfc3339())
        .bind(sources)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent_hansard_questions(&self, limit: usize) -> Result<Vec<HansardQuestionRecord>> {
        let rows = sqlx::query(
            "SELECT id, question_text, category, created_at, source_article_ids
             FROM hansard_questions ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let sources: Vec<i64> =
                    serde_json::from_str(&row.get::<String, _>("source_article_ids"))?;
                Ok(HansardQuestionRecord {
                    id: row.get("id"),
                    question_text: row.get("question_text"),
                    category: row.get("category"),
                    created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
                    source_article_ids: sources,
                })
            })
            .collect()
    }

    async fn health(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
