//! Service implementations
//!
//! Real implementations of the service traits for production use

pub mod stress_trigger;

pub use stress_trigger::{apply_trigger_defaults, HttpStressTrigger};
