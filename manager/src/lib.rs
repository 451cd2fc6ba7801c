//! Code manager for the system-design sandbox
//!
//! Keeps the latest script uploaded for each service type in memory and
//! hands it out to the workers that implement that service.

pub mod core;
pub mod error;
pub mod manager_impl;

// Re-export main types
pub use crate::core::{service_type, CodeBase};
pub use error::{ManagerError, ManagerResult};
pub use manager_impl::ManagerServer;
