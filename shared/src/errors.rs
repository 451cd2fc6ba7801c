//! Shared error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} at {url} answered with status {status}")]
    UnexpectedStatus {
        operation: String,
        url: String,
        status: u16,
    },

    #[error("unable to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl SharedError {
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by the remote side being unreachable or unhappy
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::UnexpectedStatus { .. } | Self::Decode { .. }
        )
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
