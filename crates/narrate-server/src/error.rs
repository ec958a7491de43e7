//! API error handling

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("Request failed ({}): {}", self.status, self.message);
        }
        let body = Json(json!({
            "error": {
                "message": self.message,
                "code": self.status.as_u16()
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<narrate_core::Error> for ApiError {
    fn from(err: narrate_core::Error) -> Self {
        use narrate_core::Error;

        match &err {
            Error::ConfigError(_)
            | Error::EmptyText
            | Error::ExtractionError(_)
            | Error::UnsupportedFile(_)
            | Error::SegmentTooLarge { .. } => ApiError::bad_request(err.to_string()),
            // Upstream client errors (bad key, quota) are the caller's to fix.
            Error::SynthesisFailure {
                status: Some(code), ..
            } if (400..500).contains(code) => StatusCode::from_u16(*code)
                .map(|status| ApiError::new(status, err.to_string()))
                .unwrap_or_else(|_| ApiError::bad_gateway(err.to_string())),
            Error::SynthesisFailure { .. } | Error::DecodeError(_) => {
                ApiError::bad_gateway(err.to_string())
            }
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::new(err.status(), err.body_text())
    }
}
