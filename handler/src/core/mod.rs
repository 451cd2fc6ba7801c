//! Core types for the handler worker

pub mod discovery;
pub mod request;

pub use discovery::{DiscoverySnapshot, ServiceDirectory};
pub use request::{HandlerResponse, InboundRequest, CALL_HEADER};
