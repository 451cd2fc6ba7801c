//! Shared types for the system-design sandbox
//!
//! Contains the wire types every process exchanges with the control plane,
//! the control-plane HTTP client, and the ambient plumbing (logging,
//! shutdown, heartbeats) common to all binaries.

pub mod client;
pub mod endpoint;
pub mod errors;
pub mod heartbeat;
pub mod instance;
pub mod logging;
pub mod shutdown;
pub mod types;

pub use errors::*;
pub use types::*;

pub use client::{ControlPlane, HttpControlPlane};
pub use endpoint::{normalize_endpoint, parse_target};
pub use heartbeat::{join_heartbeat, spawn_heartbeat, Heartbeat, HEARTBEAT_INTERVAL};
pub use instance::instance_name;
pub use shutdown::{Shutdown, ShutdownListener};
