use axum::{
    extract::{Request, State},
    http::{header::ALLOW, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ErrorVerbosityProvider, MethodNotAllowedError};

/// Middleware to map axum's `MethodNotAllowed` response to our [`ApiError`].
///
/// The `Allow` header set by axum is kept.
pub async fn method_not_allowed<S: ErrorVerbosityProvider>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Response {
    let resp = next.run(req).await;

    match resp.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = resp.headers().get(ALLOW).cloned();

            let mut err_resp =
                ApiError::from(MethodNotAllowedError::new(state.error_verbosity())).into_response();

            if let Some(allow) = allow {
                err_resp.headers_mut().insert(ALLOW, allow);
            }

            err_resp
        }
        _ => resp,
    }
}
