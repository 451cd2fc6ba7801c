//! Core business logic for the stressor

pub mod attacker;
pub mod histogram;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod spec;

pub use attacker::Attacker;
pub use metrics::{AttackResult, Metrics, Summary};
pub use orchestrator::{RunStatus, StressOrchestrator};
pub use spec::{normalize_spec, AttackPlan};
