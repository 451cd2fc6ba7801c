//! Aggregation of attack results into load-test metrics

use hdrhistogram::Histogram;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::core::histogram::LatencyBuckets;
use crate::error::{StressorError, StressorResult};

/// Highest latency tracked with full precision, one hour in microseconds
const MAX_TRACKED_MICROS: u64 = 3_600_000_000;

/// Outcome of a single request against the target
#[derive(Debug, Clone)]
pub struct AttackResult {
    pub seq: u64,
    /// HTTP status, 0 when the request never got an answer
    pub code: u16,
    pub started: Instant,
    pub latency: Duration,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub error: Option<String>,
}

impl AttackResult {
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.code)
    }
}

/// Running aggregate of every result seen so far
pub struct Metrics {
    latencies: Histogram<u64>,
    buckets: LatencyBuckets,
    requests: u64,
    successes: u64,
    bytes_in: u64,
    bytes_out: u64,
    total_latency: Duration,
    earliest: Option<Instant>,
    latest: Option<Instant>,
    end: Option<Instant>,
    status_codes: BTreeMap<u16, u64>,
    errors: BTreeSet<String>,
}

/// Point-in-time view of [`Metrics`], ready for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub requests: u64,
    pub rate: f64,
    pub throughput: f64,
    pub duration: Duration,
    pub attack: Duration,
    pub wait: Duration,
    pub latency_min: Duration,
    pub latency_mean: Duration,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p95: Duration,
    pub latency_p99: Duration,
    pub latency_max: Duration,
    pub bytes_in_total: u64,
    pub bytes_in_mean: f64,
    pub bytes_out_total: u64,
    pub bytes_out_mean: f64,
    pub success_ratio: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: Vec<String>,
}

impl Metrics {
    pub fn new() -> StressorResult<Self> {
        let latencies = Histogram::new_with_bounds(1, MAX_TRACKED_MICROS, 3)
            .map_err(|e| StressorError::internal(format!("latency histogram: {e:?}")))?;
        Ok(Self {
            latencies,
            buckets: LatencyBuckets::default(),
            requests: 0,
            successes: 0,
            bytes_in: 0,
            bytes_out: 0,
            total_latency: Duration::ZERO,
            earliest: None,
            latest: None,
            end: None,
            status_codes: BTreeMap::new(),
            errors: BTreeSet::new(),
        })
    }

    pub fn add(&mut self, result: &AttackResult) {
        self.requests += 1;
        if result.is_success() {
            self.successes += 1;
        }
        self.bytes_in += result.bytes_in;
        self.bytes_out += result.bytes_out;
        self.total_latency += result.latency;
        *self.status_codes.entry(result.code).or_insert(0) += 1;
        if let Some(error) = &result.error {
            self.errors.insert(error.clone());
        }

        let micros = u64::try_from(result.latency.as_micros()).unwrap_or(u64::MAX).max(1);
        self.latencies.saturating_record(micros);
        self.buckets.add(result.latency);

        let finished = result.started + result.latency;
        self.earliest = Some(self.earliest.map_or(result.started, |t| t.min(result.started)));
        self.latest = Some(self.latest.map_or(result.started, |t| t.max(result.started)));
        self.end = Some(self.end.map_or(finished, |t| t.max(finished)));
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn buckets(&self) -> &LatencyBuckets {
        &self.buckets
    }

    /// Latency histogram in microseconds
    pub fn latencies(&self) -> &Histogram<u64> {
        &self.latencies
    }

    pub fn summary(&self) -> Summary {
        let (attack, duration, wait) = match (self.earliest, self.latest, self.end) {
            (Some(earliest), Some(latest), Some(end)) => (
                latest.duration_since(earliest),
                end.duration_since(earliest),
                end.duration_since(latest),
            ),
            _ => (Duration::ZERO, Duration::ZERO, Duration::ZERO),
        };

        let rate = per_second(self.requests, attack);
        let throughput = per_second(self.successes, duration);
        let empty = self.requests == 0;

        Summary {
            requests: self.requests,
            rate,
            throughput,
            duration,
            attack,
            wait,
            latency_min: if empty { Duration::ZERO } else { micros(self.latencies.min()) },
            latency_mean: if empty {
                Duration::ZERO
            } else {
                self.total_latency / u32::try_from(self.requests).unwrap_or(u32::MAX)
            },
            latency_p50: self.quantile(0.50),
            latency_p90: self.quantile(0.90),
            latency_p95: self.quantile(0.95),
            latency_p99: self.quantile(0.99),
            latency_max: if empty { Duration::ZERO } else { micros(self.latencies.max()) },
            bytes_in_total: self.bytes_in,
            bytes_in_mean: mean(self.bytes_in, self.requests),
            bytes_out_total: self.bytes_out,
            bytes_out_mean: mean(self.bytes_out, self.requests),
            success_ratio: mean(self.successes, self.requests),
            status_codes: self.status_codes.clone(),
            errors: self.errors.iter().cloned().collect(),
        }
    }

    fn quantile(&self, q: f64) -> Duration {
        if self.requests == 0 {
            return Duration::ZERO;
        }
        micros(self.latencies.value_at_quantile(q))
    }
}

fn micros(value: u64) -> Duration {
    Duration::from_micros(value)
}

fn mean(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

fn per_second(count: u64, over: Duration) -> f64 {
    let secs = over.as_secs_f64();
    if secs == 0.0 {
        0.0
    } else {
        count as f64 / secs
    }
}
