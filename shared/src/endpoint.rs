//! Endpoint normalization used by every registration path

use url::Url;

use crate::errors::{SharedError, SharedResult};

/// Trim trailing slashes and make sure what is left is an absolute URL.
///
/// `"http://a:1/"` becomes `"http://a:1"`; empty or unparsable input is
/// rejected with [`SharedError::InvalidEndpoint`].
pub fn normalize_endpoint(raw: &str) -> SharedResult<String> {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(SharedError::invalid_endpoint(raw, "endpoint is empty"));
    }
    Url::parse(trimmed).map_err(|e| SharedError::invalid_endpoint(raw, e.to_string()))?;
    Ok(trimmed.to_string())
}

/// Validate a stress target. Unlike registration endpoints the target is
/// dialed verbatim, so it is not trimmed.
pub fn parse_target(raw: &str) -> SharedResult<Url> {
    if raw.is_empty() {
        return Err(SharedError::invalid_endpoint(raw, "target is empty"));
    }
    Url::parse(raw).map_err(|e| SharedError::invalid_endpoint(raw, e.to_string()))
}
