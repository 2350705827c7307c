use axum::async_trait;
use tokio::sync::RwLock;

use super::{shelf::Shelf, Book, BookStore, NewBook, StoreError};

/// Keeps books in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    shelf: RwLock<Shelf>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `books`, with ids assigned in iteration order starting at 1.
    pub fn with_books(books: impl IntoIterator<Item = NewBook>) -> Result<Self, StoreError> {
        let mut shelf = Shelf::default();

        for book in books {
            shelf.insert(book)?;
        }

        Ok(Self {
            shelf: RwLock::new(shelf),
        })
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: NewBook) -> Result<i64, StoreError> {
        self.shelf.write().await.insert(book)
    }

    async fn update(&self, book: &Book) -> Result<(), StoreError> {
        self.shelf.write().await.update(book)
    }

    async fn delete(&self, book: &Book) -> Result<(), StoreError> {
        self.shelf.write().await.delete(book)
    }

    async fn all_ordered_by_id(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.shelf.read().await.all())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(self.shelf.read().await.get(id))
    }
}
