//! Stressor library for the system-design sandbox
//!
//! Runs one constant-pace load test at a time against a target URL and
//! serves the resulting reports. Optionally keeps itself registered with
//! the control plane.

pub mod core;
pub mod error;
pub mod services;
pub mod stressor_impl;
pub mod traits;

// Re-export main types
pub use crate::core::{RunStatus, StressOrchestrator};
pub use error::{StressorError, StressorResult};
pub use stressor_impl::StressorServer;
pub use traits::StatusNotifier;
pub use services::{ControlNotifier, StartClient};
