use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ApiError, ErrorVerbosityProvider, ResourceError, ResourceErrorProvider},
    extractor::{json::ApiJson, query::ApiQuery},
    rating::{parse_rating, RatingError},
    state::ApiState,
    store::{Book, NewBook, StoreError},
};

use super::{rejection_reason, BooksErrorContext, BooksPage, PageQuery};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateBookBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Integer, or a string holding one.
    #[serde(default)]
    pub rating: Option<Value>,
}

impl CreateBookBody {
    fn into_new_book(self) -> Result<NewBook, RatingError> {
        // A boolean is not a stored rating, even though it converts to one when updating.
        let rating = match self.rating {
            None | Some(Value::Null) => None,
            Some(Value::Bool(_)) => return Err(RatingError::WrongType("a boolean")),
            Some(rating) => Some(parse_rating(&rating)?),
        };

        Ok(NewBook {
            title: self.title,
            author: self.author,
            rating,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreateBookResponse {
    pub success: bool,
    pub created: i64,
    pub books: Vec<Book>,
    pub total_books: usize,
}

impl IntoResponse for CreateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "error_type")]
pub enum CreateBookErrorType {
    InvalidBody {
        #[serde(skip)]
        reason: String,
    },
    InvalidRating {
        #[serde(skip)]
        source: RatingError,
    },
    Store {
        #[serde(skip)]
        source: StoreError,
    },
}

impl ResourceErrorProvider for CreateBookErrorType {
    type Context = BooksErrorContext;

    fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    fn message(&self) -> &'static str {
        "unprocessable"
    }

    fn context(&self) -> Self::Context {
        match self {
            CreateBookErrorType::InvalidBody { reason } => BooksErrorContext::new(reason),
            CreateBookErrorType::InvalidRating { source } => BooksErrorContext::new(source),
            CreateBookErrorType::Store { source } => BooksErrorContext::new(source),
        }
    }
}

/// Creates a book and returns the requested page of all books.
#[tracing::instrument(name = "create_book", skip_all)]
pub async fn create_book(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<PageQuery>,
    body: Result<ApiJson<CreateBookBody>, ApiError>,
) -> Result<CreateBookResponse, ResourceError<CreateBookErrorType>> {
    let fail = |error_type| ResourceError::new(state.error_verbosity(), error_type);
    let store_failure = |source: StoreError| {
        tracing::error!(%source, "Failed to create book");

        fail(CreateBookErrorType::Store { source })
    };

    let ApiJson(body) = body.map_err(|rejection| {
        fail(CreateBookErrorType::InvalidBody {
            reason: rejection_reason(&rejection),
        })
    })?;

    let new_book = body.into_new_book().map_err(|source| {
        tracing::warn!(%source, "Invalid rating");

        fail(CreateBookErrorType::InvalidRating { source })
    })?;

    let created = state
        .store()
        .insert(new_book)
        .await
        .map_err(store_failure)?;

    tracing::info!(created, "Book created");

    let BooksPage { books, total_books } = BooksPage::fetch(state.store(), query.page)
        .await
        .map_err(store_failure)?;

    Ok(CreateBookResponse {
        success: true,
        created,
        books,
        total_books,
    })
}
