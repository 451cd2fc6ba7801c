//! Built-in request handler: forward to another service or echo

use async_trait::async_trait;
use shared::{process_debug, process_error, ProcessRole};

use crate::core::{DiscoverySnapshot, HandlerResponse, InboundRequest, CALL_HEADER};
use crate::error::{HandlerError, HandlerResult};
use crate::traits::RequestHandler;

/// Requests carrying `x-lsd-call: <service>` are POSTed to a random
/// provider of that service and its body is returned. Anything else is
/// echoed back.
#[derive(Debug, Clone, Default)]
pub struct ForwardingHandler {
    client: reqwest::Client,
}

impl ForwardingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    async fn call(&self, service: &str, body: Vec<u8>, directory: &DiscoverySnapshot) -> HandlerResult<HandlerResponse> {
        let Some(server) = directory.pick(service) else {
            process_error!(ProcessRole::current(), target_service = %service, "Unable to find server");
            return Err(HandlerError::ServiceUnavailable {
                service: service.to_string(),
            });
        };

        let call_failed = |message: String| HandlerError::CallFailed {
            service: service.to_string(),
            endpoint: server.endpoint.clone(),
            message,
        };

        process_debug!(ProcessRole::current(), target_service = %service, endpoint = %server.endpoint, "Forwarding request");
        let response = self
            .client
            .post(&server.endpoint)
            .body(body)
            .send()
            .await
            .map_err(|e| call_failed(e.to_string()))?;
        let payload = response.bytes().await.map_err(|e| call_failed(e.to_string()))?;

        Ok(HandlerResponse::text(200, payload.to_vec()))
    }
}

fn echo(request: &InboundRequest) -> HandlerResponse {
    let mut body = format!("{} {}\n", request.method, request.path).into_bytes();
    body.extend_from_slice(&request.body);
    HandlerResponse::text(200, body)
}

#[async_trait]
impl RequestHandler for ForwardingHandler {
    async fn handle(&self, request: InboundRequest, directory: DiscoverySnapshot) -> HandlerResult<HandlerResponse> {
        match request.header(CALL_HEADER).map(str::trim).filter(|s| !s.is_empty()) {
            Some(service) => {
                let service = service.to_string();
                self.call(&service, request.body, &directory).await
            }
            None => Ok(echo(&request)),
        }
    }
}
