//! HTTP error responses.
//!
//! Every per-request failure maps to a status code and a JSON body of the
//! form `{"error": "<message>"}`. None of them end the process.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned by the HTTP bindings.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Missing, malformed or mismatched bearer credential.
    #[error("Unauthorized: Invalid or missing bearer token")]
    Unauthorized,

    /// The body is not valid JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// The body is JSON but not a JSON-RPC message.
    #[error("Invalid JSON-RPC message: {0}")]
    InvalidMessage(String),

    /// `POST /message` without a `sessionId` query parameter.
    #[error("Missing sessionId parameter")]
    MissingSessionId,

    /// A POST with nothing in it.
    #[error("Empty request body")]
    EmptyBody,

    /// No live session with the given id.
    #[error("Session not found")]
    SessionNotFound,

    /// No endpoint matches the method and path.
    #[error("Not found")]
    NotFound,

    /// The body exceeds the configured limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// The client cannot accept an event stream.
    #[error("Not Acceptable: client must accept text/event-stream")]
    NotAcceptable,

    /// Any failure while handling a matched, authorized request.
    ///
    /// The detail is logged, never returned to the client.
    #[error("Internal server error")]
    Internal(String),
}

impl HttpError {
    /// The HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidJson
            | Self::InvalidMessage(_)
            | Self::MissingSessionId
            | Self::EmptyBody => StatusCode::BAD_REQUEST,
            Self::SessionNotFound | Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed");
        }
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Fallback for unmatched routes and methods.
pub async fn not_found() -> HttpError {
    HttpError::NotFound
}
