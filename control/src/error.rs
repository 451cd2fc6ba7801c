//! Control-plane error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::{ErrorEnvelope, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Malformed JSON body: {message}")]
    InvalidJson { message: String },

    #[error("Invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Unable to parse form body: {message}")]
    InvalidForm { message: String },

    #[error("Stressor not found: {name}")]
    StressorNotFound { name: String },

    #[error("Unable to start the stress test: {message}")]
    TriggerFailed { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Server startup failed on {addr}: {message}")]
    ServerStartup { addr: String, message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ControlError {
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ControlError::InvalidJson { .. }
            | ControlError::InvalidEndpoint { .. }
            | ControlError::InvalidForm { .. } => StatusCode::BAD_REQUEST,
            ControlError::StressorNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SharedError> for ControlError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::InvalidEndpoint { endpoint, reason } => ControlError::InvalidEndpoint { endpoint, reason },
            other => ControlError::TriggerFailed {
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = self.status();
        // internals stay in the log, callers get a generic message
        let msg = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Bad server, could not handle the request".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorEnvelope::new(status.as_u16(), msg))).into_response()
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
