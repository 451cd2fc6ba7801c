//! Service trait definitions for dependency injection

use async_trait::async_trait;
use shared::SharedResult;

/// Reports this stressor's state to whoever keeps track of it
#[mockall::automock]
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Short label used in logs
    fn describe(&self) -> String;

    async fn notify(&self, test_in_progress: bool) -> SharedResult<()>;
}
