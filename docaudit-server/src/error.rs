//! HTTP-facing error mapping. Wraps `docaudit_core::CoreError` plus the
//! request-level faults (malformed upload, missing arguments) that only
//! make sense at the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use docaudit_core::CoreError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Core(CoreError::DuplicateFailure(id)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("concurrent-writer violation for id {id}"),
            ),
            ServerError::Core(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ServerError::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
