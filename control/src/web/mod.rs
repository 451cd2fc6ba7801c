//! HTTP surface of the control plane

pub mod api;
pub mod dashboard;
