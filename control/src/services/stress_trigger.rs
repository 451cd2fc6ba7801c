//! Forwards dashboard trigger requests to a stressor's `/start-test`

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{parse_target, ProcessRole, StressTestSpec};
use shared::process_info;
use std::time::Duration;

use crate::error::{ControlError, ControlResult};
use crate::traits::StressTrigger;

const DEFAULT_WORKERS: i64 = 10;
const DEFAULT_SUSTAIN: Duration = Duration::from_secs(30);

/// Fill in what the dashboard form leaves out. The stressor applies its
/// own normalization on top of this.
pub fn apply_trigger_defaults(mut spec: StressTestSpec) -> ControlResult<StressTestSpec> {
    parse_target(&spec.target)?;
    if spec.method.is_empty() {
        spec.method = "GET".to_string();
    }
    if spec.workers <= 0 {
        spec.workers = DEFAULT_WORKERS;
    }
    if spec.sustain.is_zero() {
        spec.sustain = DEFAULT_SUSTAIN;
    }
    if spec.requests_per_second <= 0 {
        spec.requests_per_second = spec.workers * 10;
    }
    Ok(spec)
}

/// reqwest-backed [`StressTrigger`]
#[derive(Debug, Clone, Default)]
pub struct HttpStressTrigger {
    client: reqwest::Client,
}

impl HttpStressTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StressTrigger for HttpStressTrigger {
    async fn trigger(&self, stressor_endpoint: &str, spec: StressTestSpec) -> ControlResult<()> {
        let url = format!("{}/start-test", stressor_endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&spec)
            .send()
            .await
            .map_err(|e| ControlError::TriggerFailed {
                message: format!("{url}: {e}"),
            })?;

        if response.status() != StatusCode::CREATED {
            return Err(ControlError::TriggerFailed {
                message: format!("{url}: unexpected status code, got {}", response.status()),
            });
        }

        process_info!(
            ProcessRole::current(),
            stressor = %stressor_endpoint,
            target = %spec.target,
            "🎯 Stress test triggered"
        );
        Ok(())
    }
}
