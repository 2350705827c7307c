use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    error::{ErrorVerbosityProvider, ResourceError, ResourceErrorProvider},
    extractor::{path::ApiPath, query::ApiQuery},
    state::ApiState,
    store::{Book, StoreError},
};

use super::{BooksErrorContext, BooksPage, PageQuery};

#[derive(Debug, Serialize)]
pub struct DeleteBookResponse {
    pub success: bool,
    pub deleted: i64,
    pub books: Vec<Book>,
    pub total_books: usize,
}

impl IntoResponse for DeleteBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "error_type")]
pub enum DeleteBookErrorType {
    NotFound {
        #[serde(skip)]
        id: i64,
    },
    Store {
        #[serde(skip)]
        source: StoreError,
    },
}

impl ResourceErrorProvider for DeleteBookErrorType {
    type Context = BooksErrorContext;

    fn status_code(&self) -> StatusCode {
        match self {
            DeleteBookErrorType::NotFound { .. } => StatusCode::NOT_FOUND,
            DeleteBookErrorType::Store { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            DeleteBookErrorType::NotFound { .. } => "resource not found",
            DeleteBookErrorType::Store { .. } => "unprocessable",
        }
    }

    fn context(&self) -> Self::Context {
        match self {
            DeleteBookErrorType::NotFound { id } => {
                BooksErrorContext::new(format!("Book with id {id} not found"))
            }
            DeleteBookErrorType::Store { source } => BooksErrorContext::new(source),
        }
    }
}

/// Deletes a book and returns the requested page of the remaining books.
#[tracing::instrument(name = "delete_book", skip_all)]
pub async fn delete_book(
    State(state): State<ApiState>,
    ApiPath(book_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<DeleteBookResponse, ResourceError<DeleteBookErrorType>> {
    let fail = |error_type| ResourceError::new(state.error_verbosity(), error_type);
    let store_failure = |source: StoreError| {
        tracing::error!(%source, book_id, "Failed to delete book");

        fail(DeleteBookErrorType::Store { source })
    };

    let book = state
        .store()
        .get_by_id(book_id)
        .await
        .map_err(store_failure)?
        .ok_or_else(|| fail(DeleteBookErrorType::NotFound { id: book_id }))?;

    state.store().delete(&book).await.map_err(store_failure)?;

    tracing::info!(book_id, "Book deleted");

    let BooksPage { books, total_books } = BooksPage::fetch(state.store(), query.page)
        .await
        .map_err(store_failure)?;

    Ok(DeleteBookResponse {
        success: true,
        deleted: book_id,
        books,
        total_books,
    })
}
