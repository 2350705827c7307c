use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::{ApiError, ErrorVerbosityProvider, ResourceError, ResourceErrorProvider},
    extractor::{json::ApiJson, path::ApiPath},
    rating::{parse_rating, RatingError},
    state::ApiState,
    store::StoreError,
};

use super::{rejection_reason, BooksErrorContext};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateRatingBody {
    /// `None` if the key is absent, `Some(Value::Null)` if it is `null`.
    #[serde(default, deserialize_with = "present")]
    #[schemars(with = "Option<Value>")]
    pub rating: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct UpdateRatingResponse {
    pub success: bool,
    pub book_id: i64,
}

impl IntoResponse for UpdateRatingResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "error_type")]
pub enum UpdateRatingErrorType {
    NotFound {
        #[serde(skip)]
        id: i64,
    },
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

impl ResourceErrorProvider for UpdateRatingErrorType {
    type Context = BooksErrorContext;

    fn status_code(&self) -> StatusCode {
        match self {
            UpdateRatingErrorType::NotFound { .. } => StatusCode::NOT_FOUND,
            UpdateRatingErrorType::InvalidBody { .. }
            | UpdateRatingErrorType::InvalidRating { .. }
            | UpdateRatingErrorType::Store { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            UpdateRatingErrorType::NotFound { .. } => "resource not found",
            _ => "bad request",
        }
    }

    fn context(&self) -> Self::Context {
        match self {
            UpdateRatingErrorType::NotFound { id } => {
                BooksErrorContext::new(format!("Book with id {id} not found"))
            }
            UpdateRatingErrorType::InvalidBody { reason } => BooksErrorContext::new(reason),
            UpdateRatingErrorType::InvalidRating { source } => BooksErrorContext::new(source),
            UpdateRatingErrorType::Store { source } => BooksErrorContext::new(source),
        }
    }
}

/// Sets the rating of a book.
///
/// A body without `rating` changes nothing and still succeeds.
#[tracing::instrument(name = "update_rating", skip_all)]
pub async fn update_rating(
    State(state): State<ApiState>,
    ApiPath(book_id): ApiPath<i64>,
    body: Result<ApiJson<UpdateRatingBody>, ApiError>,
) -> Result<UpdateRatingResponse, ResourceError<UpdateRatingErrorType>> {
    let fail = |error_type| ResourceError::new(state.error_verbosity(), error_type);

    let mut book = state
        .store()
        .get_by_id(book_id)
        .await
        .map_err(|source| {
            tracing::error!(%source, book_id, "Failed to look up book");

            fail(UpdateRatingErrorType::Store { source })
        })?
        .ok_or_else(|| fail(UpdateRatingErrorType::NotFound { id: book_id }))?;

    let ApiJson(body) = body.map_err(|rejection| {
        fail(UpdateRatingErrorType::InvalidBody {
            reason: rejection_reason(&rejection),
        })
    })?;

    if let Some(rating) = body.rating {
        let rating = parse_rating(&rating).map_err(|source| {
            tracing::warn!(%source, book_id, "Invalid rating");

            fail(UpdateRatingErrorType::InvalidRating { source })
        })?;

        book.rating = Some(rating);

        state.store().update(&book).await.map_err(|source| {
            tracing::error!(%source, book_id, "Failed to update book");

            fail(UpdateRatingErrorType::Store { source })
        })?;

        tracing::info!(book_id, rating, "Rating updated");
    }

    Ok(UpdateRatingResponse {
        success: true,
        book_id,
    })
}
