//! In-memory code store keyed by service type

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{ManagerError, ManagerResult};

/// Strip the file extension from a requested name.
///
/// `frontend.lua` maps to `frontend`. A name without any extension is
/// rejected.
pub fn service_type(name: &str) -> ManagerResult<&str> {
    match name.rfind('.') {
        Some(dot) => Ok(&name[..dot]),
        None => Err(ManagerError::MissingExtension { name: name.to_string() }),
    }
}

/// Latest code uploaded per service type
#[derive(Debug, Default)]
pub struct CodeBase {
    code: RwLock<HashMap<String, String>>,
}

impl CodeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the code for `service_type`.
    ///
    /// Returns `false` for an empty upload, which leaves the stored code
    /// untouched.
    pub async fn store(&self, service_type: &str, code: &[u8]) -> ManagerResult<bool> {
        if code.is_empty() {
            return Ok(false);
        }
        let code = std::str::from_utf8(code).map_err(|_| ManagerError::NotUtf8)?;
        self.code
            .write()
            .await
            .insert(service_type.to_string(), code.to_string());
        Ok(true)
    }

    pub async fn fetch(&self, service_type: &str) -> ManagerResult<String> {
        self.code
            .read()
            .await
            .get(service_type)
            .cloned()
            .ok_or_else(|| ManagerError::NoCode {
                service_type: service_type.to_string(),
            })
    }

    pub async fn len(&self) -> usize {
        self.code.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.code.read().await.is_empty()
    }
}
