use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::QuoteSearchError;

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be decoded as a search request
    InvalidRequest(JsonRejection),
    /// Any provider or store failure
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidRequest(rejection) => {
                (rejection.status(), "invalid_request", rejection.body_text())
            }
            ApiError::Internal(message) => {
                error!("Search request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection)
    }
}

impl From<QuoteSearchError> for ApiError {
    fn from(err: QuoteSearchError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
