//! Service implementations

pub mod control_notifier;
pub mod start_client;

pub use control_notifier::ControlNotifier;
pub use start_client::StartClient;
