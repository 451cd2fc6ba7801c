//! Control plane for the system-design sandbox
//!
//! Keeps an in-memory registry of services, stressors and live worker
//! instances, serves it as JSON and as an HTML dashboard, and lets an
//! operator trigger stress runs on registered stressors.

pub mod control_impl;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod web;

// Re-export main types
pub use control_impl::ControlPlaneServer;
pub use crate::core::{RegistryStore, INSTANCE_TTL};
pub use error::{ControlError, ControlResult};

// Re-export trait definitions
pub use traits::StressTrigger;

// Re-export service implementations
pub use services::HttpStressTrigger;
