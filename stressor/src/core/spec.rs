//! Validation and defaults for incoming stress-test requests

use reqwest::Method;
use shared::{parse_target, StressTestSpec};
use std::time::Duration;
use url::Url;

use crate::error::{StressorError, StressorResult};

/// Longest run a stressor accepts
pub const MAX_SUSTAIN: Duration = Duration::from_secs(60);
/// Used when the requested sustain is zero or above [`MAX_SUSTAIN`]
pub const DEFAULT_SUSTAIN: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUESTS_PER_SECOND: i64 = 10;

/// Apply defaults in a fixed order: target, sustain, timeout, method,
/// rate, workers.
pub fn normalize_spec(mut spec: StressTestSpec) -> StressorResult<StressTestSpec> {
    validate_target(&spec.target)?;

    if spec.sustain.is_zero() || spec.sustain > MAX_SUSTAIN {
        spec.sustain = DEFAULT_SUSTAIN;
    }
    if spec.timeout.is_zero() || spec.timeout > spec.sustain {
        spec.timeout = spec.sustain;
    }
    if spec.method.is_empty() {
        spec.method = "GET".to_string();
    }
    if spec.requests_per_second <= 0 {
        spec.requests_per_second = DEFAULT_REQUESTS_PER_SECOND;
    }
    if spec.workers <= 0 {
        spec.workers = i64::try_from(num_cpus::get()).unwrap_or(1);
    }
    Ok(spec)
}

fn validate_target(target: &str) -> StressorResult<Url> {
    parse_target(target).map_err(|e| StressorError::InvalidTarget {
        target: target.to_string(),
        reason: e.to_string(),
    })
}

/// Everything the attacker needs, parsed out of a normalized spec
#[derive(Debug, Clone)]
pub struct AttackPlan {
    pub name: String,
    pub target: Url,
    pub method: Method,
    pub requests_per_second: u64,
    pub workers: usize,
    pub timeout: Duration,
    pub sustain: Duration,
}

impl AttackPlan {
    pub fn from_spec(spec: &StressTestSpec) -> StressorResult<Self> {
        let target = validate_target(&spec.target)?;
        let method = Method::from_bytes(spec.method.as_bytes()).map_err(|_| StressorError::InvalidMethod {
            method: spec.method.clone(),
        })?;

        Ok(Self {
            name: spec.name.clone(),
            target,
            method,
            requests_per_second: u64::try_from(spec.requests_per_second).unwrap_or(0).max(1),
            workers: usize::try_from(spec.workers).unwrap_or(0).max(1),
            timeout: spec.timeout,
            sustain: spec.sustain,
        })
    }

    /// Time between two consecutive hits
    pub fn pace(&self) -> Duration {
        Duration::from_nanos((1_000_000_000 / self.requests_per_second).max(1))
    }
}
