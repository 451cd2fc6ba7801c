//! Service trait definitions for dependency injection

use async_trait::async_trait;

use crate::core::{DiscoverySnapshot, HandlerResponse, InboundRequest};
use crate::error::HandlerResult;

/// Per-request business logic of a worker, treated as a black box by the
/// server around it
#[mockall::automock]
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: InboundRequest, directory: DiscoverySnapshot) -> HandlerResult<HandlerResponse>;
}
