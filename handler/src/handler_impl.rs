//! Handler worker HTTP server
//!
//! Every path and method lands in the injected [`RequestHandler`]. The
//! server counts requests for the instance heartbeat and hands the handler
//! the current discovery snapshot.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use shared::{process_error, process_info, ProcessRole, ShutdownListener};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{InboundRequest, ServiceDirectory};
use crate::error::HandlerResult;
use crate::traits::RequestHandler;

pub struct HandlerServer<H>
where
    H: RequestHandler,
{
    handler: Arc<H>,
    directory: Arc<ServiceDirectory>,
    requests: Arc<AtomicI64>,
}

impl<H: RequestHandler> Clone for HandlerServer<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            directory: self.directory.clone(),
            requests: self.requests.clone(),
        }
    }
}

impl<H> HandlerServer<H>
where
    H: RequestHandler + 'static,
{
    pub fn new(handler: H, directory: Arc<ServiceDirectory>) -> Self {
        Self {
            handler: Arc::new(handler),
            directory,
            requests: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn directory(&self) -> &Arc<ServiceDirectory> {
        &self.directory
    }

    /// Shared request counter, read by the registration heartbeat
    pub fn request_counter(&self) -> Arc<AtomicI64> {
        self.requests.clone()
    }

    pub fn requests_served(&self) -> i64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn build_router(&self) -> Router {
        Router::new()
            .fallback(handle_request::<H>)
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    pub async fn run(&self, addr: SocketAddr, shutdown: ShutdownListener) -> HandlerResult<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    pub async fn serve(&self, listener: TcpListener, shutdown: ShutdownListener) -> HandlerResult<()> {
        let local = listener.local_addr()?;
        process_info!(ProcessRole::current(), "🌐 Handler listening on http://{}", local);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;
        Ok(())
    }
}

async fn handle_request<H>(
    State(server): State<HandlerServer<H>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    H: RequestHandler + 'static,
{
    server.requests.fetch_add(1, Ordering::Relaxed);

    let request = InboundRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect(),
        body: body.to_vec(),
    };
    let snapshot = server.directory.snapshot().await;

    match server.handler.handle(request, snapshot).await {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
            (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
        }
        Err(e) => {
            process_error!(ProcessRole::current(), method = %method, path = %uri.path(), error = %e, "Error while processing request");
            e.into_response()
        }
    }
}
