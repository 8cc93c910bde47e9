//! HTTP error replies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use guessnum_game::wire::AckResponse;
use tracing::warn;

use crate::store::StoreError;

/// A failed request, rendered as `{"success": false, "error": ...}`.
#[derive(Debug, Clone, Display, Error)]
#[display("{status}: {message}")]
pub struct ApiError {
    /// Status code sent to the client.
    pub status: StatusCode,
    /// Human-readable reason.
    pub message: String,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Invalid { .. } => StatusCode::BAD_REQUEST,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Conflict { .. } => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, message = %self.message, "Request failed");
        (self.status, Json(AckResponse::failure(self.message))).into_response()
    }
}
