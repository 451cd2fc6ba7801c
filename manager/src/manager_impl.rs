//! Manager HTTP server
//!
//! `PUT /code/:name` uploads the code for a service type and
//! `GET /code/:name` hands it out. The name carries a file extension that
//! is dropped before use.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use shared::{process_debug, process_info, ProcessRole, ShutdownListener};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{service_type, CodeBase};
use crate::error::{ManagerError, ManagerResult};

pub const CODE_CONTENT_TYPE: &str = "text/x-lua; charset=utf-8";

#[derive(Clone, Default)]
pub struct ManagerServer {
    codebase: Arc<CodeBase>,
}

impl ManagerServer {
    pub fn new(codebase: Arc<CodeBase>) -> Self {
        Self { codebase }
    }

    pub fn codebase(&self) -> &Arc<CodeBase> {
        &self.codebase
    }

    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/code/:name", get(get_code).put(put_code))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    pub async fn run(&self, addr: SocketAddr, shutdown: ShutdownListener) -> ManagerResult<()> {
        let listener = TcpListener::bind(addr).await.map_err(|e| ManagerError::ServerStartup {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
        self.serve(listener, shutdown).await
    }

    pub async fn serve(&self, listener: TcpListener, shutdown: ShutdownListener) -> ManagerResult<()> {
        let local = listener.local_addr()?;
        process_info!(ProcessRole::current(), "🌐 Manager listening on http://{}", local);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;
        Ok(())
    }
}

async fn put_code(
    State(server): State<ManagerServer>,
    Path(name): Path<String>,
    body: Bytes,
) -> ManagerResult<StatusCode> {
    let service = service_type(&name)?;
    if server.codebase.store(service, &body).await? {
        process_info!(ProcessRole::current(), service, bytes = body.len(), "📦 Code updated");
    } else {
        process_debug!(ProcessRole::current(), service, "Empty upload ignored");
    }
    Ok(StatusCode::OK)
}

async fn get_code(State(server): State<ManagerServer>, Path(name): Path<String>) -> ManagerResult<impl IntoResponse> {
    let code = server.codebase.fetch(service_type(&name)?).await?;
    Ok(([(header::CONTENT_TYPE, CODE_CONTENT_TYPE)], code))
}
