//! Single-flight stress-test orchestration
//!
//! `ongoing`, the active spec and both reports live behind one mutex that is
//! only held for short reads and writes. A second mutex is held for the
//! whole duration of a run so two attack bodies can never overlap.

use async_trait::async_trait;
use shared::{logging, process_info, process_warn, Heartbeat, ProcessRole, SharedResult, ShutdownListener, StressTestSpec};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::attacker::Attacker;
use crate::core::metrics::Metrics;
use crate::core::report::{hdr_plot, text_report};
use crate::core::spec::{normalize_spec, AttackPlan};
use crate::error::{StressorError, StressorResult};
use crate::traits::StatusNotifier;

/// Results processed between two progress publications
pub const PUBLISH_EVERY: u64 = 100;

#[derive(Debug, Default)]
struct RunState {
    ongoing: bool,
    spec: Option<StressTestSpec>,
    text_report: Option<String>,
    plot_report: Option<String>,
}

/// What `GET /` shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    NoTests,
    Running { partial: Option<String> },
    Finished { report: String },
}

impl RunStatus {
    pub fn in_progress(&self) -> bool {
        matches!(self, RunStatus::Running { .. })
    }

    pub fn render(&self) -> String {
        match self {
            RunStatus::NoTests => "no tests\n".to_string(),
            RunStatus::Running { partial: None } => {
                "... Test is in progress, partial results are not available\n".to_string()
            }
            RunStatus::Running { partial: Some(report) } => {
                format!("... Test is in progress, partial results are partial\n{report}")
            }
            RunStatus::Finished { report } => report.clone(),
        }
    }
}

pub struct StressOrchestrator {
    state: Mutex<RunState>,
    run_lock: Mutex<()>,
    notifier: Option<Arc<dyn StatusNotifier>>,
    shutdown: ShutdownListener,
}

impl StressOrchestrator {
    pub fn new(notifier: Option<Arc<dyn StatusNotifier>>, shutdown: ShutdownListener) -> Self {
        Self {
            state: Mutex::new(RunState::default()),
            run_lock: Mutex::new(()),
            notifier,
            shutdown,
        }
    }

    /// Validate `spec` and launch a run in the background.
    ///
    /// Returns the normalized spec. Fails with `TestInProgress` without
    /// touching any state when a run is already going.
    pub async fn start_test(self: &Arc<Self>, spec: StressTestSpec) -> StressorResult<StressTestSpec> {
        let spec = normalize_spec(spec)?;
        let plan = AttackPlan::from_spec(&spec)?;

        {
            let mut state = self.state.lock().await;
            if state.ongoing {
                return Err(StressorError::TestInProgress);
            }
            state.ongoing = true;
            state.spec = Some(spec.clone());
        }

        process_info!(
            ProcessRole::current(),
            target = %spec.target,
            method = %spec.method,
            rps = spec.requests_per_second,
            workers = spec.workers,
            sustain = ?spec.sustain,
            "🔥 Stress test started"
        );

        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.perform(plan).await });
        Ok(spec)
    }

    pub async fn is_ongoing(&self) -> bool {
        self.state.lock().await.ongoing
    }

    /// Spec of the current or last run
    pub async fn current_spec(&self) -> Option<StressTestSpec> {
        self.state.lock().await.spec.clone()
    }

    pub async fn status(&self) -> RunStatus {
        let state = self.state.lock().await;
        match (state.ongoing, &state.text_report) {
            (false, None) => RunStatus::NoTests,
            (true, partial) => RunStatus::Running {
                partial: partial.clone(),
            },
            (false, Some(report)) => RunStatus::Finished { report: report.clone() },
        }
    }

    pub async fn histogram_report(&self) -> StressorResult<String> {
        self.state
            .lock()
            .await
            .plot_report
            .clone()
            .ok_or(StressorError::ReportUnavailable)
    }

    async fn perform(self: Arc<Self>, plan: AttackPlan) {
        {
            let _run = self.run_lock.lock().await;
            if let Err(e) = self.drive(plan).await {
                logging::log_error(ProcessRole::current(), "Stress test", &e);
            }
        }

        self.state.lock().await.ongoing = false;
        logging::log_success(ProcessRole::current(), "Stress test finished");
        self.notify().await;
    }

    async fn drive(&self, plan: AttackPlan) -> StressorResult<()> {
        let mut metrics = Metrics::new()?;
        let mut results = Attacker::new(plan)?.attack(self.shutdown.clone());

        while let Some(result) = results.recv().await {
            metrics.add(&result);
            if metrics.requests() % PUBLISH_EVERY == 0 {
                self.notify().await;
                self.publish(&metrics).await;
            }
        }
        self.publish(&metrics).await;
        Ok(())
    }

    async fn publish(&self, metrics: &Metrics) {
        let text = text_report(metrics);
        let plot = hdr_plot(metrics.latencies());

        let mut state = self.state.lock().await;
        state.text_report = Some(text);
        state.plot_report = Some(plot);
    }

    async fn notify(&self) {
        let Some(notifier) = &self.notifier else { return };
        let ongoing = self.is_ongoing().await;
        if let Err(e) = notifier.notify(ongoing).await {
            process_warn!(
                ProcessRole::current(),
                notifier = %notifier.describe(),
                error = %e,
                "Unable to register"
            );
        }
    }
}

/// The periodic heartbeat reports the live `ongoing` flag
#[async_trait]
impl Heartbeat for StressOrchestrator {
    fn describe(&self) -> String {
        match &self.notifier {
            Some(notifier) => notifier.describe(),
            None => "stressor (no control plane)".to_string(),
        }
    }

    async fn beat(&self) -> SharedResult<()> {
        match &self.notifier {
            Some(notifier) => notifier.notify(self.is_ongoing().await).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockStatusNotifier;
    use shared::Shutdown;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spec(target: &str, sustain_ms: u64) -> StressTestSpec {
        let mut spec = StressTestSpec::new(target);
        spec.sustain = Duration::from_millis(sustain_ms);
        spec.requests_per_second = 10;
        spec.workers = 1;
        spec
    }

    async fn no_content_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        server
    }

    async fn wait_idle(orchestrator: &StressOrchestrator) {
        for _ in 0..100 {
            if !orchestrator.is_ongoing().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("run did not finish");
    }

    #[tokio::test]
    async fn status_before_any_run() {
        let orchestrator = StressOrchestrator::new(None, Shutdown::new().listener());
        let status = orchestrator.status().await;
        assert_eq!(status, RunStatus::NoTests);
        assert_eq!(status.render(), "no tests\n");
        assert!(matches!(
            orchestrator.histogram_report().await,
            Err(StressorError::ReportUnavailable)
        ));
    }

    #[tokio::test]
    async fn second_start_conflicts_without_touching_the_first() {
        let server = no_content_server().await;
        let orchestrator = Arc::new(StressOrchestrator::new(None, Shutdown::new().listener()));

        orchestrator.start_test(spec(&server.uri(), 200)).await.unwrap();
        let err = orchestrator
            .start_test(spec("http://other.invalid", 200))
            .await
            .unwrap_err();
        assert!(matches!(err, StressorError::TestInProgress));
        assert_eq!(orchestrator.current_spec().await.unwrap().target, server.uri());

        wait_idle(&orchestrator).await;
        assert!(matches!(orchestrator.status().await, RunStatus::Finished { .. }));
        assert!(orchestrator.histogram_report().await.unwrap().contains("Value(ms)"));
    }

    #[tokio::test]
    async fn invalid_spec_leaves_state_alone() {
        let orchestrator = Arc::new(StressOrchestrator::new(None, Shutdown::new().listener()));
        let err = orchestrator.start_test(StressTestSpec::default()).await.unwrap_err();
        assert!(matches!(err, StressorError::InvalidTarget { .. }));
        assert!(!orchestrator.is_ongoing().await);
        assert!(orchestrator.current_spec().await.is_none());
    }

    #[tokio::test]
    async fn running_then_finished() {
        let server = no_content_server().await;
        let orchestrator = Arc::new(StressOrchestrator::new(None, Shutdown::new().listener()));

        orchestrator.start_test(spec(&server.uri(), 100)).await.unwrap();
        let status = orchestrator.status().await;
        assert!(status.in_progress());
        assert!(status.render().starts_with("... Test is in progress"));

        tokio::time::sleep(Duration::from_millis(150)).await;
        wait_idle(&orchestrator).await;

        let status = orchestrator.status().await;
        assert!(!status.in_progress());
        assert!(status.render().contains("Requests"));
        assert!(!server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn completion_notifies_not_in_progress() {
        let server = no_content_server().await;
        let mut notifier = MockStatusNotifier::new();
        notifier.expect_describe().return_const("mock".to_string());
        notifier
            .expect_notify()
            .withf(|in_progress| !*in_progress)
            .times(1)
            .returning(|_| Ok(()));

        let orchestrator = Arc::new(StressOrchestrator::new(
            Some(Arc::new(notifier)),
            Shutdown::new().listener(),
        ));
        orchestrator.start_test(spec(&server.uri(), 100)).await.unwrap();
        wait_idle(&orchestrator).await;
        // notification follows the state flip
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn progress_is_published_every_hundred_results() {
        let server = no_content_server().await;
        let mut notifier = MockStatusNotifier::new();
        notifier.expect_describe().return_const("mock".to_string());
        notifier
            .expect_notify()
            .withf(|in_progress| *in_progress)
            .times(1..)
            .returning(|_| Ok(()));
        notifier
            .expect_notify()
            .withf(|in_progress| !*in_progress)
            .times(1)
            .returning(|_| Ok(()));

        let orchestrator = Arc::new(StressOrchestrator::new(
            Some(Arc::new(notifier)),
            Shutdown::new().listener(),
        ));
        let mut fast = spec(&server.uri(), 800);
        fast.requests_per_second = 1000;
        fast.workers = 4;
        orchestrator.start_test(fast).await.unwrap();

        let mut partial = None;
        for _ in 0..80 {
            if let status @ RunStatus::Running { partial: Some(_) } = orchestrator.status().await {
                partial = Some(status);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let status = partial.expect("partial report during the run");
        let rendered = status.render();
        let (banner, report) = rendered.split_once('\n').unwrap();
        assert_eq!(banner, "... Test is in progress, partial results are partial");
        assert!(report.starts_with("Requests"));
        assert!(orchestrator.histogram_report().await.is_ok());

        wait_idle(&orchestrator).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn shutdown_ends_a_run_and_keeps_the_partial_report() {
        let server = no_content_server().await;
        let shutdown = Shutdown::new();
        let orchestrator = Arc::new(StressOrchestrator::new(None, shutdown.listener()));

        orchestrator.start_test(spec(&server.uri(), 30_000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.trigger();

        wait_idle(&orchestrator).await;
        assert!(matches!(orchestrator.status().await, RunStatus::Finished { .. }));
    }

    #[tokio::test]
    async fn heartbeat_reports_live_state() {
        let mut notifier = MockStatusNotifier::new();
        notifier
            .expect_notify()
            .withf(|in_progress| !*in_progress)
            .times(1)
            .returning(|_| Ok(()));
        let orchestrator = StressOrchestrator::new(Some(Arc::new(notifier)), Shutdown::new().listener());
        orchestrator.beat().await.unwrap();

        let silent = StressOrchestrator::new(None, Shutdown::new().listener());
        assert!(silent.beat().await.is_ok());
    }
}
