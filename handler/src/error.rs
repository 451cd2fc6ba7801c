//! Handler error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::ErrorEnvelope;
use thiserror::Error;

/// Result type for handler operations
pub type HandlerResult<T> = Result<T, HandlerError>;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("unable to find any server that implements service {service}")]
    ServiceUnavailable { service: String },

    #[error("unable to perform POST request on {endpoint} for service {service}: {message}")]
    CallFailed {
        service: String,
        endpoint: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HandlerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::ServiceUnavailable { .. } | HandlerError::CallFailed { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorEnvelope::new(status.as_u16(), self.to_string()))).into_response()
    }
}
