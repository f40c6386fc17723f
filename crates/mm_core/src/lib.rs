pub mod config;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod retry;
pub mod store;
pub mod summarize;
pub mod types;

pub use config::AppConfig;
pub use error::Error;
pub use fetch::{ContentFetcher, ScrapeResult};
pub use notify::Notifier;
pub use retry::RetryPolicy;
pub use store::{normalize_url, ArticleStore};
pub use summarize::{Summarizer, SummaryResult};
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        ArchivedArticle, ArticleStore, ContentFetcher, Error, Notifier, PendingArticle, Report,
        Result, Summarizer,
    };
}
