use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    error::{ErrorVerbosityProvider, ResourceError, ResourceErrorProvider},
    extractor::query::ApiQuery,
    state::ApiState,
    store::{Book, StoreError},
};

use super::{BooksErrorContext, BooksPage, PageQuery};

#[derive(Debug, Serialize)]
pub struct ListBooksResponse {
    pub success: bool,
    pub books: Vec<Book>,
    pub total_books: usize,
}

impl IntoResponse for ListBooksResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "error_type")]
pub enum ListBooksErrorType {
    PageNotFound {
        #[serde(skip)]
        page: i64,
    },
    Store {
        #[serde(skip)]
        source: StoreError,
    },
}

impl ResourceErrorProvider for ListBooksErrorType {
    type Context = BooksErrorContext;

    fn status_code(&self) -> StatusCode {
        match self {
            ListBooksErrorType::PageNotFound { .. } => StatusCode::NOT_FOUND,
            ListBooksErrorType::Store { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ListBooksErrorType::PageNotFound { .. } => "resource not found",
            ListBooksErrorType::Store { .. } => "unprocessable",
        }
    }

    fn context(&self) -> Self::Context {
        match self {
            ListBooksErrorType::PageNotFound { page } => {
                BooksErrorContext::new(format!("Page {page} holds no books"))
            }
            ListBooksErrorType::Store { source } => BooksErrorContext::new(source),
        }
    }
}

/// Lists one page of books ordered by id.
///
/// An empty page is not found, whether the catalog is empty or the page is past its end.
#[tracing::instrument(name = "list_books", skip_all)]
pub async fn list_books(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<ListBooksResponse, ResourceError<ListBooksErrorType>> {
    let page = query.page;

    let BooksPage { books, total_books } = BooksPage::fetch(state.store(), page)
        .await
        .map_err(|source| {
            tracing::error!(%source, "Failed to list books");

            ResourceError::new(
                state.error_verbosity(),
                ListBooksErrorType::Store { source },
            )
        })?;

    if books.is_empty() {
        tracing::debug!(page, total_books, "Empty page");

        return Err(ResourceError::new(
            state.error_verbosity(),
            ListBooksErrorType::PageNotFound { page },
        ));
    }

    Ok(ListBooksResponse {
        success: true,
        books,
        total_books,
    })
}
