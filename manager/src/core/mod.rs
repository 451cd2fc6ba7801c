//! Code storage

pub mod codebase;

pub use codebase::{service_type, CodeBase};
