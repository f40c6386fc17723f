pub mod backends;

pub use backends::memory::MemoryStore;
pub use backends::sqlite::SqliteStore;

pub mod prelude {
    pub use super::{MemoryStore, SqliteStore};
    pub use mm_core::{ArticleStore, Error, Result};
}
