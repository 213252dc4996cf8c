//! Mapping from rowgate faults to HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rowgate_core::RowgateError;
use serde::Serialize;

/// Error response with code and message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details including code and message
    pub error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code (E1001, E3001-E3004)
    pub code: String,
    /// Human-readable error description
    pub message: String,
}

/// Handler error that renders as a standardized JSON error response.
#[derive(Debug)]
pub struct ApiError(pub RowgateError);

impl ApiError {
    /// HTTP status for the wrapped fault.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RowgateError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            RowgateError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            RowgateError::Statement(_)
            | RowgateError::Serialization(_)
            | RowgateError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RowgateError> for ApiError {
    fn from(err: RowgateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail { code: self.0.code().to_string(), message: self.0.to_string() },
        };

        (self.status(), Json(body)).into_response()
    }
}
