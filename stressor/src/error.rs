//! Stressor error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::ErrorEnvelope;
use thiserror::Error;

/// Result type for stressor operations
pub type StressorResult<T> = Result<T, StressorError>;

#[derive(Error, Debug)]
pub enum StressorError {
    #[error("Malformed JSON body: {message}")]
    InvalidJson { message: String },

    #[error("Invalid or missing target")]
    InvalidTarget { target: String, reason: String },

    #[error("Invalid HTTP method: {method:?}")]
    InvalidMethod { method: String },

    #[error("There is one test already in progress, try again later")]
    TestInProgress,

    #[error("Data is not available yet, try again in a couple of seconds.")]
    ReportUnavailable,

    #[error("Stressor answered {status} while starting the test")]
    StartRejected { status: u16 },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StressorError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StressorError::InvalidJson { .. }
            | StressorError::InvalidTarget { .. }
            | StressorError::InvalidMethod { .. } => StatusCode::BAD_REQUEST,
            StressorError::TestInProgress | StressorError::ReportUnavailable => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StressorError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Bad server, could not handle the request".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorEnvelope::new(status.as_u16(), msg))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_are_409() {
        assert_eq!(StressorError::TestInProgress.status(), StatusCode::CONFLICT);
        assert_eq!(StressorError::ReportUnavailable.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_is_400() {
        let err = StressorError::InvalidTarget {
            target: String::new(),
            reason: "endpoint is empty".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid or missing target");
        assert_eq!(
            StressorError::InvalidMethod { method: "G E T".into() }.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internals_are_500() {
        assert_eq!(StressorError::internal("histogram").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
