//! In-memory registry of services, stressors and worker instances
//!
//! One reader/writer lock guards all three directories. Registrations take
//! it exclusively; snapshots sweep expired instances under the exclusive
//! lock and then downgrade to a shared lock to copy.

use chrono::{DateTime, Utc};
use shared::{normalize_endpoint, InstanceRecord, ProcessRole, RegistrySnapshot, ServiceRecord, StressorRecord};
use shared::{process_debug, process_info};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::core::sweeper::{sweep, INSTANCE_TTL};
use crate::error::{ControlError, ControlResult};

/// Target pre-filled in the dashboard when no frontend is registered
pub const FALLBACK_STRESS_TARGET: &str = "http://invalid.localhost";

#[derive(Debug, Default)]
struct Directories {
    services: Vec<ServiceRecord>,
    stressors: Vec<StressorRecord>,
    instances: BTreeMap<String, InstanceRecord>,
}

impl Directories {
    fn add_service(&mut self, record: ServiceRecord) -> bool {
        let exists = self
            .services
            .iter()
            .any(|s| s.service == record.service && s.endpoint == record.endpoint);
        if !exists {
            self.services.push(record);
        }
        !exists
    }

    fn add_stressor(&mut self, record: StressorRecord) -> bool {
        match self
            .stressors
            .iter_mut()
            .find(|s| s.base_endpoint == record.base_endpoint)
        {
            Some(existing) => {
                existing.test_in_progress = record.test_in_progress;
                existing.name = record.name;
                false
            }
            None => {
                self.stressors.push(record);
                true
            }
        }
    }
}

/// Concurrency-safe registry owned by the control-plane server
#[derive(Debug, Default)]
pub struct RegistryStore {
    directories: RwLock<Directories>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` as a provider of `service`. Re-registering the
    /// same pair is a no-op.
    pub async fn register_service(&self, service: &str, endpoint: &str) -> ControlResult<()> {
        let endpoint = normalize_endpoint(endpoint)?;
        let record = ServiceRecord::new(service, endpoint);

        let added = self.directories.write().await.add_service(record.clone());
        if added {
            process_info!(
                ProcessRole::current(),
                service = %record.service,
                endpoint = %record.endpoint,
                "📝 Service registered"
            );
        }
        Ok(())
    }

    /// Register a stressor, keyed by its base endpoint. An existing entry
    /// takes the new name and `test_in_progress`.
    pub async fn register_stressor(&self, name: &str, base_endpoint: &str, test_in_progress: bool) -> ControlResult<()> {
        let base_endpoint = normalize_endpoint(base_endpoint)?;
        let record = StressorRecord {
            base_endpoint,
            name: name.to_string(),
            test_in_progress,
        };

        let added = self.directories.write().await.add_stressor(record.clone());
        if added {
            process_info!(
                ProcessRole::current(),
                name = %record.name,
                endpoint = %record.base_endpoint,
                "📝 Stressor registered"
            );
        }
        Ok(())
    }

    /// Upsert an instance heartbeat stamped with the current time
    pub async fn register_instance(&self, name: &str, payload: InstanceRecord) {
        self.register_instance_at(name, payload, Utc::now()).await
    }

    /// Upsert an instance heartbeat stamped with `now`, then sweep
    pub async fn register_instance_at(&self, name: &str, mut payload: InstanceRecord, now: DateTime<Utc>) {
        payload.name = name.to_string();
        payload.last_ping = Some(now);
        payload.time_since_last_ping_ms = 0;

        let mut directories = self.directories.write().await;
        directories.instances.insert(payload.name.clone(), payload);
        let evicted = sweep(&mut directories.instances, now, INSTANCE_TTL);
        drop(directories);

        log_evictions(&evicted);
    }

    /// Point-in-time copy of the whole registry
    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot_at(Utc::now()).await
    }

    /// Sweep as of `now`, then copy under a shared lock
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> RegistrySnapshot {
        let mut directories = self.directories.write().await;
        let evicted = sweep(&mut directories.instances, now, INSTANCE_TTL);
        let directories = directories.downgrade();

        let snapshot = RegistrySnapshot {
            servers: directories.services.clone(),
            stressors: directories.stressors.clone(),
            instances: directories.instances.clone(),
        };
        drop(directories);

        log_evictions(&evicted);
        snapshot
    }

    /// Registered services only. Does not sweep, so it only needs a shared lock.
    pub async fn services(&self) -> Vec<ServiceRecord> {
        self.directories.read().await.services.clone()
    }

    /// Most recently registered stressor with this name
    pub async fn find_stressor_by_name(&self, name: &str) -> ControlResult<StressorRecord> {
        self.directories
            .read()
            .await
            .stressors
            .iter()
            .rev()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| ControlError::StressorNotFound { name: name.to_string() })
    }
}

/// Endpoint of the last registered `frontend` service, the natural thing to stress
pub fn default_stress_target(services: &[ServiceRecord]) -> String {
    services
        .iter()
        .rev()
        .find(|s| s.service == "frontend")
        .map(|s| s.endpoint.clone())
        .unwrap_or_else(|| FALLBACK_STRESS_TARGET.to_string())
}

fn log_evictions(evicted: &[String]) {
    for name in evicted {
        process_debug!(ProcessRole::current(), instance = %name, "🗑️ Evicted silent instance");
    }
}
