//! HTTP client for the control-plane registration API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::{InstanceRecord, ServiceRecord, StressorRecord};

/// Registration and discovery calls a process makes against the control plane
#[mockall::automock]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Announce that `endpoint` serves `service`
    async fn register_service(&self, service: &str, endpoint: &str) -> SharedResult<()>;

    /// Announce a stressor and whether it is currently running a test
    async fn register_stressor(&self, name: &str, endpoint: &str, test_in_progress: bool) -> SharedResult<()>;

    /// Heartbeat a worker instance
    async fn register_instance(&self, instance: InstanceRecord) -> SharedResult<()>;

    /// Fetch every registered service
    async fn services(&self) -> SharedResult<Vec<ServiceRecord>>;
}

/// reqwest-backed [`ControlPlane`]
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    base: String,
}

#[derive(Deserialize)]
struct ServersOnly {
    #[serde(default)]
    servers: Vec<ServiceRecord>,
}

impl HttpControlPlane {
    pub fn new(control_endpoint: &str) -> Self {
        Self::with_client(reqwest::Client::new(), control_endpoint)
    }

    pub fn with_client(client: reqwest::Client, control_endpoint: &str) -> Self {
        Self {
            client,
            base: control_endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }

    async fn put_json<T>(&self, path: &str, body: &T, operation: &str) -> SharedResult<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.base, path);
        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| SharedError::Upstream { url: url.clone(), source })?;

        if response.status() != StatusCode::OK {
            return Err(SharedError::UnexpectedStatus {
                operation: operation.to_string(),
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn register_service(&self, service: &str, endpoint: &str) -> SharedResult<()> {
        let body = ServiceRecord::new(service, endpoint);
        self.put_json(&format!("/register/service/{service}"), &body, "register service")
            .await
    }

    async fn register_stressor(&self, name: &str, endpoint: &str, test_in_progress: bool) -> SharedResult<()> {
        let body = StressorRecord {
            base_endpoint: endpoint.to_string(),
            name: name.to_string(),
            test_in_progress,
        };
        self.put_json(&format!("/register/stressor/{name}"), &body, "register stressor")
            .await
    }

    async fn register_instance(&self, mut instance: InstanceRecord) -> SharedResult<()> {
        // liveness is stamped by the control plane, never by the caller
        instance.last_ping = None;
        instance.time_since_last_ping_ms = 0;
        let path = format!("/register/instance/{}", instance.name);
        self.put_json(&path, &instance, "register instance").await
    }

    async fn services(&self) -> SharedResult<Vec<ServiceRecord>> {
        let url = format!("{}/registry", self.base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SharedError::Upstream { url: url.clone(), source })?;

        if response.status() != StatusCode::OK {
            return Err(SharedError::UnexpectedStatus {
                operation: "fetch registry".to_string(),
                url,
                status: response.status().as_u16(),
            });
        }

        let registry: ServersOnly = response.json().await.map_err(|e| SharedError::Decode {
            url,
            message: e.to_string(),
        })?;
        Ok(registry.servers)
    }
}
