//! Cancellable periodic heartbeat task

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::errors::SharedResult;
use crate::shutdown::ShutdownListener;
use crate::logging;
use crate::types::ProcessRole;
use crate::{process_debug, process_warn};

/// How often workers and stressors announce themselves
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// One round of announcing a process to the control plane
#[async_trait]
pub trait Heartbeat: Send + Sync + 'static {
    /// Short label used in logs
    fn describe(&self) -> String;

    async fn beat(&self) -> SharedResult<()>;
}

/// Run `heartbeat` now and then every `interval` until shutdown.
///
/// A failed beat is logged and retried on the next tick. A beat still in
/// flight when shutdown arrives is dropped.
pub fn spawn_heartbeat<H>(heartbeat: Arc<H>, interval: Duration, shutdown: ShutdownListener) -> JoinHandle<()>
where
    H: Heartbeat + ?Sized,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                result = heartbeat.beat() => {
                    if let Err(e) = result {
                        process_warn!(
                            ProcessRole::current(),
                            heartbeat = %heartbeat.describe(),
                            error = %e,
                            "Unable to register, retrying on next tick"
                        );
                    }
                }
            }
        }

        process_debug!(ProcessRole::current(), heartbeat = %heartbeat.describe(), "Heartbeat stopped");
    })
}

/// Wait for a heartbeat task to end. A panicked or cancelled task is
/// logged; returns whether the task ended cleanly.
pub async fn join_heartbeat(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            logging::log_error(ProcessRole::current(), "Heartbeat task", &e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SharedError;
    use crate::shutdown::Shutdown;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        beats: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Heartbeat for Counting {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        async fn beat(&self) -> SharedResult<()> {
            self.beats.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SharedError::invalid_endpoint("", "always failing"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn beats_immediately_and_repeatedly() {
        let shutdown = Shutdown::new();
        let hb = Arc::new(Counting { beats: AtomicUsize::new(0), fail: false });

        let handle = spawn_heartbeat(hb.clone(), Duration::from_millis(20), shutdown.listener());
        tokio::time::sleep(Duration::from_millis(110)).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert!(hb.beats.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_loop() {
        let shutdown = Shutdown::new();
        let hb = Arc::new(Counting { beats: AtomicUsize::new(0), fail: true });

        let handle = spawn_heartbeat(hb.clone(), Duration::from_millis(10), shutdown.listener());
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert!(hb.beats.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn stops_promptly_on_shutdown() {
        let shutdown = Shutdown::new();
        let hb = Arc::new(Counting { beats: AtomicUsize::new(0), fail: false });

        let handle = spawn_heartbeat(hb.clone(), Duration::from_secs(3600), shutdown.listener());
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("heartbeat should stop")
            .unwrap();
        assert_eq!(hb.beats.load(Ordering::SeqCst), 1);
    }

    struct Panicking;

    #[async_trait]
    impl Heartbeat for Panicking {
        fn describe(&self) -> String {
            "panicking".to_string()
        }

        async fn beat(&self) -> SharedResult<()> {
            panic!("beat exploded");
        }
    }

    #[tokio::test]
    async fn join_reports_a_panicked_task() {
        let shutdown = Shutdown::new();
        let handle = spawn_heartbeat(Arc::new(Panicking), Duration::from_secs(60), shutdown.listener());
        assert!(!join_heartbeat(handle).await);

        let hb = Arc::new(Counting { beats: AtomicUsize::new(0), fail: false });
        let handle = spawn_heartbeat(hb, Duration::from_secs(60), shutdown.listener());
        shutdown.trigger();
        assert!(join_heartbeat(handle).await);
    }
}
