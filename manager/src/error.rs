//! Manager error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::ErrorEnvelope;
use thiserror::Error;

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Missing extension, must be .lua")]
    MissingExtension { name: String },

    #[error("Code must be utf-8 encoded")]
    NotUtf8,

    #[error("No code for {service_type}")]
    NoCode { service_type: String },

    #[error("Server startup failed on {addr}: {message}")]
    ServerStartup { addr: String, message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ManagerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ManagerError::MissingExtension { .. } | ManagerError::NoCode { .. } => StatusCode::NOT_FOUND,
            ManagerError::NotUtf8 => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ManagerError {
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
