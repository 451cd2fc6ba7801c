//! Local service-discovery cache
//!
//! Refreshed wholesale from the control plane on every heartbeat. Request
//! handlers read an immutable snapshot, so a refresh never blocks behind a
//! slow request.

use rand::seq::SliceRandom;
use shared::ServiceRecord;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read-only view of the known services handed to request handlers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySnapshot {
    records: Arc<Vec<ServiceRecord>>,
}

impl DiscoverySnapshot {
    pub fn new(records: Vec<ServiceRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    pub fn endpoints(&self, service: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.service == service)
            .map(|r| r.endpoint.as_str())
            .collect()
    }

    /// Uniformly random provider of `service`
    pub fn pick(&self, service: &str) -> Option<&ServiceRecord> {
        let candidates: Vec<&ServiceRecord> = self.records.iter().filter(|r| r.service == service).collect();
        candidates.choose(&mut rand::thread_rng()).copied()
    }
}

#[derive(Debug)]
pub struct ServiceDirectory {
    own_endpoint: String,
    current: RwLock<DiscoverySnapshot>,
}

impl ServiceDirectory {
    /// `own_endpoint` is filtered out of every refresh so a worker never
    /// calls itself
    pub fn new(own_endpoint: impl Into<String>) -> Self {
        Self {
            own_endpoint: own_endpoint.into().trim_end_matches('/').to_string(),
            current: RwLock::new(DiscoverySnapshot::default()),
        }
    }

    pub async fn replace(&self, records: Vec<ServiceRecord>) {
        let records: Vec<ServiceRecord> = records
            .into_iter()
            .filter(|r| r.endpoint.trim_end_matches('/') != self.own_endpoint)
            .collect();
        *self.current.write().await = DiscoverySnapshot::new(records);
    }

    pub async fn snapshot(&self) -> DiscoverySnapshot {
        self.current.read().await.clone()
    }
}
