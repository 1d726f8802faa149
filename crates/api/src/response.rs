//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard success envelope.
///
/// Every endpoint answers `{status, message, error, data}`; list endpoints
/// add `results` and the auth endpoints add `token`. Failures carry the
/// same envelope via `AppError`'s `IntoResponse`, with `status` of `fail`
/// (4xx) or `error` (5xx).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    status: &'static str,
    message: String,
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    data: T,
    #[serde(skip)]
    code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 success response.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            error: None,
            results: None,
            token: None,
            data,
            code: StatusCode::OK,
        }
    }

    /// A 201 success response.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            code: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }

    /// Attach a `results` count (list endpoints).
    #[must_use]
    pub const fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }

    /// Attach a session token (auth endpoints).
    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}
