//! Registry state and liveness rules

pub mod registry;
pub mod sweeper;

pub use registry::RegistryStore;
pub use sweeper::{sweep, INSTANCE_TTL};
