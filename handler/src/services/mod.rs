//! Service implementations

pub mod forwarding;
pub mod registration;

pub use forwarding::ForwardingHandler;
pub use registration::RegistrationHeartbeat;
