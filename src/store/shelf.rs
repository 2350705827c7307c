use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Book, NewBook, StoreError};

/// The books of a store keyed by id, plus the last id handed out.
#[derive(Debug, Clone, Default)]
pub(super) struct Shelf {
    last_id: i64,
    books: BTreeMap<i64, Book>,
}

impl Shelf {
    pub(super) fn insert(&mut self, book: NewBook) -> Result<i64, StoreError> {
        let id = self.last_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;

        self.books.insert(id, book.into_book(id));
        self.last_id = id;

        Ok(id)
    }

    pub(super) fn update(&mut self, book: &Book) -> Result<(), StoreError> {
        let stored = self
            .books
            .get_mut(&book.id)
            .ok_or(StoreError::Missing(book.id))?;

        *stored = book.clone();

        Ok(())
    }

    pub(super) fn delete(&mut self, book: &Book) -> Result<(), StoreError> {
        self.books
            .remove(&book.id)
            .map(|_| ())
            .ok_or(StoreError::Missing(book.id))
    }

    pub(super) fn all(&self) -> Vec<Book> {
        self.books.values().cloned().collect()
    }

    pub(super) fn get(&self, id: i64) -> Option<Book> {
        self.books.get(&id).cloned()
    }
}

/// On-disk layout of a [`Shelf`].
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ShelfFile {
    last_id: i64,
    books: Vec<Book>,
}

impl From<&Shelf> for ShelfFile {
    fn from(shelf: &Shelf) -> Self {
        ShelfFile {
            last_id: shelf.last_id,
            books: shelf.all(),
        }
    }
}

impl From<ShelfFile> for Shelf {
    fn from(file: ShelfFile) -> Self {
        let books: BTreeMap<i64, Book> = file.books.into_iter().map(|b| (b.id, b)).collect();

        // An id already on the shelf is never handed out again.
        let max_id = books.keys().next_back().copied().unwrap_or(0);

        Shelf {
            last_id: file.last_id.max(max_id),
            books,
        }
    }
}
