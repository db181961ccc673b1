//! Error types for the admin API and the mock dispatcher.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body sent for requests that match no mock.
pub const NOT_FOUND_BODY: &str = "Mock endpoint not found";

/// Errors returned to admin API callers.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Client input was malformed or incomplete
    #[error("{0}")]
    Validation(String),
    /// The addressed mock does not exist
    #[error("{0}")]
    NotFound(String),
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        AdminError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AdminError::NotFound(message.into())
    }

    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// No mock is registered for the requested route.
#[derive(Debug, Error)]
#[error("no mock registered for {method} {path}")]
pub struct MockNotFound {
    pub method: String,
    pub path: String,
}

impl IntoResponse for MockNotFound {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
    }
}

/// Failure turning a stored mock into a response.
///
/// Covers stored data the HTTP layer rejects. These never reach the client as
/// errors; the dispatcher logs them and answers 500. Failures writing an
/// already-built response to the socket happen inside hyper and are not
/// represented here.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("invalid response header {name:?}")]
    InvalidHeader { name: String },

    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}
