//! Service trait definitions for dependency injection

use async_trait::async_trait;
use shared::StressTestSpec;

use crate::error::ControlResult;

/// Starts a stress run on a remote stressor
#[mockall::automock]
#[async_trait]
pub trait StressTrigger: Send + Sync {
    /// Post `spec` to the stressor at `stressor_endpoint`
    async fn trigger(&self, stressor_endpoint: &str, spec: StressTestSpec) -> ControlResult<()>;
}
