use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorVerbosity {
    /// Server returns the envelope with the status code and the message.
    #[default]
    Message,
    /// Server returns the envelope and the error type with cleared error content.
    Type,
    /// Server returns the envelope, the error type and the error content.
    Full,
}

impl ErrorVerbosity {
    pub fn should_generate_error_type(&self) -> bool {
        matches!(self, ErrorVerbosity::Type | ErrorVerbosity::Full)
    }

    pub fn should_generate_error_reason(&self) -> bool {
        matches!(self, ErrorVerbosity::Full)
    }
}

pub trait ErrorVerbosityProvider {
    fn error_verbosity(&self) -> ErrorVerbosity;
}

/// The body of every failed response.
///
/// `details` is only present for [`ErrorVerbosity::Type`] and [`ErrorVerbosity::Full`].
#[derive(Debug, Serialize)]
struct ErrorEnvelope<D> {
    success: bool,
    error: u16,
    message: &'static str,
    #[serde(flatten)]
    details: Option<D>,
}

impl<D: Serialize> ErrorEnvelope<D> {
    fn new(status_code: StatusCode, message: &'static str, details: Option<D>) -> Self {
        Self {
            success: false,
            error: status_code.as_u16(),
            message,
            details,
        }
    }

    fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, Json(self)).into_response()
    }
}

#[derive(Debug, From, Serialize)]
#[serde(tag = "error_type", content = "error_details")]
/// API error
///
/// Failures raised before a handler runs: extractor rejections, unknown routes and methods.
pub enum ApiError {
    /// Internal server error
    ///
    /// This error is returned when an internal server error occurs.
    InternalServerError(InternalServerError),
    /// Query error
    ///
    /// This error is returned when the query parameters are not as expected.
    Query(QueryError),
    /// Body error
    ///
    /// This error is returned when the body is not as expected.
    Body(BodyError),
    /// Path error
    ///
    /// This error is returned when the path parameters do not identify a resource.
    Path(PathError),
    /// Method not allowed
    ///
    /// This error is returned when the method is not allowed.
    MethodNotAllowed(MethodNotAllowedError),
    /// Not found error
    ///
    /// This error is returned when the requested route does not exist.
    NotFound(NotFoundError),
    /// Unsupported media type
    ///
    /// This error is returned when the request body is encoded in a way the server cannot decode.
    UnsupportedMediaType(UnsupportedMediaTypeError),
}

impl ApiError {
    fn verbosity(&self) -> ErrorVerbosity {
        match self {
            ApiError::InternalServerError(err) => err.verbosity,
            ApiError::Query(err) => err.verbosity,
            ApiError::Body(err) => err.verbosity,
            ApiError::Path(err) => err.verbosity,
            ApiError::MethodNotAllowed(err) => err.verbosity,
            ApiError::NotFound(err) => err.verbosity,
            ApiError::UnsupportedMediaType(err) => err.verbosity,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::InternalServerError(_) => "internal server error",
            ApiError::Query(_) => "bad request",
            ApiError::Body(_) => "bad request",
            ApiError::Path(_) => "resource not found",
            ApiError::MethodNotAllowed(_) => "method not allowed",
            ApiError::NotFound(_) => "resource not found",
            ApiError::UnsupportedMediaType(_) => "unsupported media type",
        }
    }

    /// The rejection reason, kept only when the verbosity allows it.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::InternalServerError(err) => err.internal_server_error.as_deref(),
            ApiError::Query(err) => err.query_error_reason.as_deref(),
            ApiError::Body(err) => err.body_error_reason.as_deref(),
            ApiError::Path(err) => err.path_error_reason.as_deref(),
            ApiError::UnsupportedMediaType(err) => err.content_encoding.as_deref(),
            ApiError::MethodNotAllowed(_) | ApiError::NotFound(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Path(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let message = self.message();
        let details = self.verbosity().should_generate_error_type().then_some(self);

        ErrorEnvelope::new(status_code, message, details).into_response_with_status(status_code)
    }
}

#[derive(Debug, Serialize)]
pub struct InternalServerError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    internal_server_error: Option<String>,
}

impl InternalServerError {
    pub fn from_generic_error<E: Into<anyhow::Error>>(verbosity: ErrorVerbosity, err: E) -> Self {
        let err: anyhow::Error = err.into();
        let err = format!("{err:#}");
        tracing::error!(%err, "Internal server error");

        let internal_server_error = verbosity.should_generate_error_reason().then_some(err);

        InternalServerError {
            verbosity,
            internal_server_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    query_error_reason: Option<String>,
    query_expected_schema: Option<String>,
}

impl QueryError {
    pub fn new(
        verbosity: ErrorVerbosity,
        query_error_reason: String,
        query_expected_schema: String,
    ) -> Self {
        let (query_error_reason, query_expected_schema) =
            match verbosity.should_generate_error_reason() {
                true => (Some(query_error_reason), Some(query_expected_schema)),
                false => (None, None),
            };

        QueryError {
            verbosity,
            query_error_reason,
            query_expected_schema,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BodyError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    body_error_reason: Option<String>,
    body_expected_schema: Option<String>,
}

impl BodyError {
    pub fn new(
        verbosity: ErrorVerbosity,
        body_error_reason: String,
        body_expected_schema: String,
    ) -> Self {
        let (body_error_reason, body_expected_schema) =
            match verbosity.should_generate_error_reason() {
                true => (Some(body_error_reason), Some(body_expected_schema)),
                false => (None, None),
            };

        BodyError {
            verbosity,
            body_error_reason,
            body_expected_schema,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PathError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    path_error_reason: Option<String>,
}

impl PathError {
    pub fn new(verbosity: ErrorVerbosity, path_error_reason: String) -> Self {
        let path_error_reason = verbosity
            .should_generate_error_reason()
            .then_some(path_error_reason);

        PathError {
            verbosity,
            path_error_reason,
        }
    }

    pub fn from_path_rejection(verbosity: ErrorVerbosity, rejection: PathRejection) -> ApiError {
        match rejection {
            PathRejection::MissingPathParams(err) => {
                InternalServerError::from_generic_error(verbosity, err).into()
            }
            rejection => PathError::new(verbosity, rejection.body_text()).into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MethodNotAllowedError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl MethodNotAllowedError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        MethodNotAllowedError { verbosity }
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl NotFoundError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        NotFoundError { verbosity }
    }
}

#[derive(Debug, Serialize)]
pub struct UnsupportedMediaTypeError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    content_encoding: Option<String>,
}

impl UnsupportedMediaTypeError {
    pub fn new(verbosity: ErrorVerbosity, content_encoding: Option<String>) -> Self {
        let content_encoding = content_encoding
            .filter(|_| verbosity.should_generate_error_reason());

        UnsupportedMediaTypeError {
            verbosity,
            content_encoding,
        }
    }
}

/// Describes how a resource specific error type is rendered.
pub trait ResourceErrorProvider {
    type Context: Serialize;

    fn status_code(&self) -> StatusCode;

    fn message(&self) -> &'static str;

    fn context(&self) -> Self::Context;
}

/// An error returned by a resource handler.
///
/// The error type decides the status code, the verbosity decides how much of it reaches the caller.
#[derive(Debug)]
pub struct ResourceError<T> {
    verbosity: ErrorVerbosity,
    error_type: T,
}

impl<T> ResourceError<T> {
    pub fn new(verbosity: ErrorVerbosity, error_type: T) -> Self {
        Self {
            verbosity,
            error_type,
        }
    }
}

#[derive(Serialize)]
struct ResourceErrorDetails<'a, T, C> {
    #[serde(flatten)]
    error_type: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<C>,
}

impl<T> IntoResponse for ResourceError<T>
where
    T: ResourceErrorProvider + Serialize,
{
    fn into_response(self) -> Response {
        let status_code = self.error_type.status_code();
        let message = self.error_type.message();

        let details = self
            .verbosity
            .should_generate_error_type()
            .then(|| ResourceErrorDetails {
                error_type: &self.error_type,
                context: self
                    .verbosity
                    .should_generate_error_reason()
                    .then(|| self.error_type.context()),
            });

        ErrorEnvelope::new(status_code, message, details).into_response_with_status(status_code)
    }
}
