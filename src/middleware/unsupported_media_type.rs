use axum::{
    extract::{Request, State},
    http::{
        header::{CONTENT_ENCODING, CONTENT_TYPE},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ErrorVerbosityProvider, UnsupportedMediaTypeError};

/// Middleware to map the bodyless 415 of the request decompression layer to our [`ApiError`].
///
/// Responses that already carry a body are left alone.
pub async fn unsupported_media_type<S: ErrorVerbosityProvider>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Response {
    let content_encoding = req
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let resp = next.run(req).await;

    match resp.status() {
        StatusCode::UNSUPPORTED_MEDIA_TYPE if !resp.headers().contains_key(CONTENT_TYPE) => {
            tracing::warn!(?content_encoding, "Unsupported content encoding");

            ApiError::from(UnsupportedMediaTypeError::new(
                state.error_verbosity(),
                content_encoding,
            ))
            .into_response()
        }
        _ => resp,
    }
}
