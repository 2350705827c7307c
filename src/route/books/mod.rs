use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    pagination::paginate,
    store::{Book, BookStore, StoreError},
};

pub mod app;
pub mod create_book;
pub mod delete_book;
pub mod list_books;
pub mod update_rating;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PageQuery {
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

/// One page of books and the number of books on all pages.
#[derive(Debug)]
struct BooksPage {
    books: Vec<Book>,
    total_books: usize,
}

impl BooksPage {
    async fn fetch(store: &dyn BookStore, page: i64) -> Result<Self, StoreError> {
        let books = store.all_ordered_by_id().await?;

        Ok(BooksPage {
            books: paginate(&books, page),
            total_books: books.len(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BooksErrorContext {
    pub reason: String,
}

impl BooksErrorContext {
    fn new(reason: impl ToString) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

fn rejection_reason(rejection: &ApiError) -> String {
    rejection
        .reason()
        .unwrap_or("Request body could not be parsed")
        .to_string()
}
