//! Core shared types exchanged between processes and the control plane

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

static PROCESS_ROLE: OnceLock<ProcessRole> = OnceLock::new();
static UNASSIGNED: ProcessRole = ProcessRole::Unassigned;

/// Role of the current process, rendered into every log line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessRole {
    /// Nothing called `init` yet (unit tests, library use)
    Unassigned,
    ControlPlane,
    Manager,
    Stressor(String),
    Handler(String),
}

impl ProcessRole {
    /// Install the global role. The first call wins.
    pub fn init(role: ProcessRole) -> &'static ProcessRole {
        PROCESS_ROLE.get_or_init(|| role)
    }

    pub fn current() -> &'static ProcessRole {
        PROCESS_ROLE.get().unwrap_or(&UNASSIGNED)
    }

    /// Crate whose log events the default filter lets through
    pub fn log_target(&self) -> &'static str {
        match self {
            ProcessRole::Unassigned => "shared",
            ProcessRole::ControlPlane => "control",
            ProcessRole::Manager => "manager",
            ProcessRole::Stressor(_) => "stressor",
            ProcessRole::Handler(_) => "handler",
        }
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Unassigned => write!(f, "unassigned"),
            ProcessRole::ControlPlane => write!(f, "control-plane"),
            ProcessRole::Manager => write!(f, "manager"),
            ProcessRole::Stressor(name) => write!(f, "stressor/{name}"),
            ProcessRole::Handler(name) => write!(f, "handler/{name}"),
        }
    }
}

/// A service offered at an endpoint. Unique by `(service, endpoint)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub endpoint: String,
}

impl ServiceRecord {
    pub fn new(service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// A stress-test runner. Unique by `base_endpoint`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StressorRecord {
    pub base_endpoint: String,
    pub name: String,
    pub test_in_progress: bool,
}

/// Counters a worker instance reports with every heartbeat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetrics {
    #[serde(default)]
    pub requests: i64,
}

/// A live worker process. Unique by `name`; evicted once its heartbeat expires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ping: Option<DateTime<Utc>>,
    /// Derived at read time, never trusted from the wire
    #[serde(default, skip_serializing_if = "is_zero")]
    pub time_since_last_ping_ms: i64,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
    #[serde(default)]
    pub metrics: InstanceMetrics,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl InstanceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_service(mut self, service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.services.insert(service.into(), endpoint.into());
        self
    }
}

/// Point-in-time copy of the whole registry as served on `GET /registry`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub servers: Vec<ServiceRecord>,
    #[serde(default, rename = "stressor")]
    pub stressors: Vec<StressorRecord>,
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceRecord>,
}

/// Input to a stress run. Durations travel as integer nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StressTestSpec {
    pub name: String,
    pub target: String,
    pub method: String,
    pub requests_per_second: i64,
    pub workers: i64,
    #[serde(with = "duration_nanos")]
    pub timeout: Duration,
    #[serde(with = "duration_nanos", alias = "sustainDuration")]
    pub sustain: Duration,
}

impl StressTestSpec {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }
}

/// `{"ok": true, "msg": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub msg: String,
}

impl SuccessEnvelope {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            ok: true,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub msg: String,
    pub status: u16,
}

/// `{"error": {"msg": ..., "status": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(status: u16, msg: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                msg: msg.into(),
                status,
            },
        }
    }
}

/// Serde adapter for durations encoded as signed nanoseconds.
/// Negative values collapse to zero.
pub mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        serializer.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = i64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn process_role_display() {
        assert_eq!(ProcessRole::ControlPlane.to_string(), "control-plane");
        assert_eq!(ProcessRole::Stressor("s1".into()).to_string(), "stressor/s1");
        assert_eq!(ProcessRole::Handler("h1".into()).to_string(), "handler/h1");
        assert_eq!(ProcessRole::Handler("h1".into()).log_target(), "handler");
    }

    #[test]
    fn stress_spec_uses_nanosecond_durations() {
        let spec: StressTestSpec = serde_json::from_value(json!({
            "target": "http://x",
            "sustain": 100_000_000i64,
            "timeout": -5,
            "requestsPerSecond": 10
        }))
        .unwrap();

        assert_eq!(spec.sustain, Duration::from_millis(100));
        assert_eq!(spec.timeout, Duration::ZERO);
        assert_eq!(spec.requests_per_second, 10);
        assert_eq!(spec.method, "");

        let encoded = serde_json::to_value(&spec).unwrap();
        assert_eq!(encoded["sustain"], json!(100_000_000i64));
        assert_eq!(encoded["requestsPerSecond"], json!(10));
    }

    #[test]
    fn instance_omits_unset_ping_fields() {
        let instance = InstanceRecord::new("w1").with_service("frontend", "http://a:1");
        let encoded = serde_json::to_value(&instance).unwrap();

        assert!(encoded.get("lastPing").is_none());
        assert!(encoded.get("timeSinceLastPingMs").is_none());
        assert_eq!(encoded["services"]["frontend"], json!("http://a:1"));
        assert_eq!(encoded["metrics"]["requests"], json!(0));
    }

    #[test]
    fn snapshot_uses_legacy_stressor_key() {
        let snapshot = RegistrySnapshot {
            stressors: vec![StressorRecord {
                base_endpoint: "http://s:1".into(),
                name: "s".into(),
                test_in_progress: true,
            }],
            ..Default::default()
        };
        let encoded = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(encoded["stressor"][0]["baseEndpoint"], json!("http://s:1"));
        assert_eq!(encoded["stressor"][0]["testInProgress"], json!(true));
        assert_eq!(encoded["servers"], json!([]));
        assert_eq!(encoded["instances"], json!({}));
    }

    #[test]
    fn envelopes_have_expected_shape() {
        assert_eq!(
            serde_json::to_value(SuccessEnvelope::new("done")).unwrap(),
            json!({"ok": true, "msg": "done"})
        );
        assert_eq!(
            serde_json::to_value(ErrorEnvelope::new(400, "bad")).unwrap(),
            json!({"error": {"msg": "bad", "status": 400}})
        );
    }
}
