//! Registers the stressor with the control plane

use async_trait::async_trait;
use shared::{ControlPlane, SharedResult};

use crate::traits::StatusNotifier;

/// [`StatusNotifier`] backed by a [`ControlPlane`] client
pub struct ControlNotifier<C: ControlPlane> {
    control: C,
    name: String,
    public_endpoint: String,
}

impl<C: ControlPlane> ControlNotifier<C> {
    pub fn new(control: C, name: impl Into<String>, public_endpoint: impl Into<String>) -> Self {
        Self {
            control,
            name: name.into(),
            public_endpoint: public_endpoint.into(),
        }
    }
}

#[async_trait]
impl<C: ControlPlane> StatusNotifier for ControlNotifier<C> {
    fn describe(&self) -> String {
        format!("stressor {} at {}", self.name, self.public_endpoint)
    }

    async fn notify(&self, test_in_progress: bool) -> SharedResult<()> {
        self.control
            .register_stressor(&self.name, &self.public_endpoint, test_in_progress)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::client::MockControlPlane;
    use shared::SharedError;

    #[tokio::test]
    async fn registers_name_endpoint_and_state() {
        let mut control = MockControlPlane::new();
        control
            .expect_register_stressor()
            .withf(|name: &str, endpoint: &str, in_progress: &bool| {
                name == "s1" && endpoint == "http://s:1" && *in_progress
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let notifier = ControlNotifier::new(control, "s1", "http://s:1");
        notifier.notify(true).await.unwrap();
        assert!(notifier.describe().contains("s1"));
    }

    #[tokio::test]
    async fn failures_are_passed_through() {
        let mut control = MockControlPlane::new();
        control.expect_register_stressor().returning(|_, _, _| {
            Err(SharedError::UnexpectedStatus {
                operation: "register stressor".into(),
                url: "http://control".into(),
                status: 500,
            })
        });

        let notifier = ControlNotifier::new(control, "s1", "http://s:1");
        assert!(notifier.notify(false).await.unwrap_err().is_upstream());
    }
}
