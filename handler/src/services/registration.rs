//! Periodic self-registration of a handler worker

use async_trait::async_trait;
use shared::{process_warn, ControlPlane, Heartbeat, InstanceRecord, ProcessRole, SharedResult};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::core::ServiceDirectory;

/// One tick registers the service, heartbeats the instance with its request
/// count, then refreshes the discovery cache. Each step fails on its own.
pub struct RegistrationHeartbeat<C: ControlPlane> {
    control: C,
    name: String,
    service: String,
    public_endpoint: String,
    requests: Arc<AtomicI64>,
    directory: Arc<ServiceDirectory>,
}

impl<C: ControlPlane> RegistrationHeartbeat<C> {
    pub fn new(
        control: C,
        name: impl Into<String>,
        service: impl Into<String>,
        public_endpoint: impl Into<String>,
        requests: Arc<AtomicI64>,
        directory: Arc<ServiceDirectory>,
    ) -> Self {
        Self {
            control,
            name: name.into(),
            service: service.into(),
            public_endpoint: public_endpoint.into(),
            requests,
            directory,
        }
    }

    fn instance(&self) -> InstanceRecord {
        let mut instance = InstanceRecord::new(&self.name).with_service(&self.service, &self.public_endpoint);
        instance.metrics.requests = self.requests.load(Ordering::Relaxed);
        instance
    }

    fn warn(&self, step: &str, error: &dyn std::fmt::Display) {
        process_warn!(
            ProcessRole::current(),
            name = %self.name,
            service = %self.service,
            endpoint = %self.public_endpoint,
            error = %error,
            "Unable to {}", step
        );
    }
}

#[async_trait]
impl<C: ControlPlane + 'static> Heartbeat for RegistrationHeartbeat<C> {
    fn describe(&self) -> String {
        format!("{} serving {} at {}", self.name, self.service, self.public_endpoint)
    }

    /// Returns the first failure after attempting every step
    async fn beat(&self) -> SharedResult<()> {
        let mut first_error = None;

        if let Err(e) = self.control.register_service(&self.service, &self.public_endpoint).await {
            self.warn("register service", &e);
            first_error.get_or_insert(e);
        }

        if let Err(e) = self.control.register_instance(self.instance()).await {
            self.warn("register instance", &e);
            first_error.get_or_insert(e);
        }

        match self.control.services().await {
            Ok(records) => self.directory.replace(records).await,
            Err(e) => {
                self.warn("refresh services", &e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::client::MockControlPlane;
    use shared::{ServiceRecord, SharedError};

    fn heartbeat(control: MockControlPlane, requests: i64) -> (RegistrationHeartbeat<MockControlPlane>, Arc<ServiceDirectory>) {
        let directory = Arc::new(ServiceDirectory::new("http://me:1"));
        let beat = RegistrationHeartbeat::new(
            control,
            "w1",
            "frontend",
            "http://me:1",
            Arc::new(AtomicI64::new(requests)),
            directory.clone(),
        );
        (beat, directory)
    }

    fn unavailable() -> SharedError {
        SharedError::UnexpectedStatus {
            operation: "register".into(),
            url: "http://control".into(),
            status: 503,
        }
    }

    #[tokio::test]
    async fn beat_registers_and_refreshes() {
        let mut control = MockControlPlane::new();
        control
            .expect_register_service()
            .withf(|service: &str, endpoint: &str| service == "frontend" && endpoint == "http://me:1")
            .times(1)
            .returning(|_, _| Ok(()));
        control
            .expect_register_instance()
            .withf(|instance: &InstanceRecord| {
                instance.name == "w1"
                    && instance.metrics.requests == 7
                    && instance.services.get("frontend").map(String::as_str) == Some("http://me:1")
            })
            .times(1)
            .returning(|_| Ok(()));
        control.expect_services().times(1).returning(|| {
            Ok(vec![
                ServiceRecord::new("frontend", "http://me:1"),
                ServiceRecord::new("backend", "http://b:1"),
            ])
        });

        let (beat, directory) = heartbeat(control, 7);
        beat.beat().await.unwrap();

        let snapshot = directory.snapshot().await;
        assert_eq!(snapshot.records(), &[ServiceRecord::new("backend", "http://b:1")]);
    }

    #[tokio::test]
    async fn each_step_runs_even_when_earlier_ones_fail() {
        let mut control = MockControlPlane::new();
        control.expect_register_service().times(1).returning(|_, _| Err(unavailable()));
        control.expect_register_instance().times(1).returning(|_| Err(unavailable()));
        control
            .expect_services()
            .times(1)
            .returning(|| Ok(vec![ServiceRecord::new("backend", "http://b:1")]));

        let (beat, directory) = heartbeat(control, 0);
        assert!(beat.beat().await.is_err());
        assert_eq!(directory.snapshot().await.records().len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_directory() {
        let mut control = MockControlPlane::new();
        control.expect_register_service().returning(|_, _| Ok(()));
        control.expect_register_instance().returning(|_| Ok(()));
        control.expect_services().times(1).returning(|| Err(unavailable()));

        let (beat, directory) = heartbeat(control, 0);
        directory.replace(vec![ServiceRecord::new("backend", "http://b:1")]).await;

        assert!(beat.beat().await.is_err());
        assert_eq!(directory.snapshot().await.endpoints("backend"), vec!["http://b:1"]);
    }
}
