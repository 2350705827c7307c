use std::{path::PathBuf, sync::Arc};

use axum::async_trait;
use serde::{Deserialize, Serialize};

mod file;
mod memory;
mod shelf;

pub use file::JsonFileBookStore;
pub use memory::InMemoryBookStore;

/// A stored book.
///
/// `id` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub rating: Option<i64>,
}

/// A book that has not been assigned an id yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
}

impl NewBook {
    fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            rating: self.rating,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Book with id {0} does not exist")]
    Missing(i64),
    #[error("No book ids left to assign")]
    IdsExhausted,
    #[error("Failed to read the store file: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write the store file: {0}")]
    Write(#[source] std::io::Error),
    #[error("Failed to decode the store file: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Failed to encode the store file: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Persistence for books.
///
/// Implementations are shared between in-flight requests and serialize writes themselves.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Stores a new book and returns the id assigned to it.
    async fn insert(&self, book: NewBook) -> Result<i64, StoreError>;

    /// Replaces the stored book carrying the same id.
    async fn update(&self, book: &Book) -> Result<(), StoreError>;

    async fn delete(&self, book: &Book) -> Result<(), StoreError>;

    /// Returns every book, ordered by ascending id.
    async fn all_ordered_by_id(&self) -> Result<Vec<Book>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Books live as long as the process.
    Memory {
        /// Inserted in order when the store is opened.
        #[serde(default)]
        seed: Vec<NewBook>,
    },
    /// Books are written to a JSON file after every change.
    File { path: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory { seed: Vec::new() }
    }
}

impl StoreConfig {
    #[tracing::instrument(skip_all)]
    pub async fn open(&self) -> Result<Arc<dyn BookStore>, StoreError> {
        match self {
            StoreConfig::Memory { seed } => {
                tracing::info!(seeded = seed.len(), "Opening in-memory store");

                let store = InMemoryBookStore::with_books(seed.iter().cloned())?;

                Ok(Arc::new(store))
            }
            StoreConfig::File { path } => {
                tracing::info!(path = %path.display(), "Opening file store");

                let store = JsonFileBookStore::open(path.clone()).await?;

                Ok(Arc::new(store))
            }
        }
    }
}
