//! Handler worker for the system-design sandbox
//!
//! Serves any request through a pluggable [`RequestHandler`], keeps a local
//! cache of registered services for request-time discovery, and heartbeats
//! itself into the control plane.

pub mod core;
pub mod error;
pub mod handler_impl;
pub mod services;
pub mod traits;

// Re-export main types
pub use crate::core::{DiscoverySnapshot, HandlerResponse, InboundRequest, ServiceDirectory};
pub use error::{HandlerError, HandlerResult};
pub use handler_impl::HandlerServer;
pub use services::{ForwardingHandler, RegistrationHeartbeat};
pub use traits::RequestHandler;
