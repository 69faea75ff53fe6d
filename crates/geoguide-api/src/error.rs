//! API error type and its JSON body.
//!
//! Every failure is rendered as `{"error": "..."}`. Internal failures are
//! logged in full but reported to clients with a fixed message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use geoguide_core::types::ErrorResponse;
use geoguide_model::ModelError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to process request";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400: missing or malformed input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 413: body exceeded the configured limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    /// 500: the detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(msg) | ApiError::PayloadTooLarge(msg) => msg,
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<geoguide_core::error::GeoguideError> for ApiError {
    fn from(err: geoguide_core::error::GeoguideError) -> Self {
        match err {
            geoguide_core::error::GeoguideError::Input(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
