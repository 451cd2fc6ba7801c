//! Stressor HTTP server
//!
//! Exposes the orchestrator over three routes: start a test, read the
//! status/report, and download the HDR percentile plot.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::{process_info, ProcessRole, ShutdownListener, StressTestSpec, SuccessEnvelope};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::StressOrchestrator;
use crate::error::{StressorError, StressorResult};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
pub struct StressorServer {
    orchestrator: Arc<StressOrchestrator>,
}

impl StressorServer {
    pub fn new(orchestrator: Arc<StressOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<StressOrchestrator> {
        &self.orchestrator
    }

    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(get_status))
            .route("/start-test", post(start_test))
            .route("/reports/hdr-histogram.txt", get(get_hdr_histogram))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    pub async fn run(&self, addr: SocketAddr, shutdown: ShutdownListener) -> StressorResult<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    pub async fn serve(&self, listener: TcpListener, shutdown: ShutdownListener) -> StressorResult<()> {
        let local = listener.local_addr()?;
        process_info!(ProcessRole::current(), "🌐 Stressor listening on http://{}", local);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;
        Ok(())
    }
}

async fn start_test(State(server): State<StressorServer>, body: Bytes) -> StressorResult<impl IntoResponse> {
    let spec: StressTestSpec =
        serde_json::from_slice(&body).map_err(|e| StressorError::InvalidJson { message: e.to_string() })?;
    server.orchestrator.start_test(spec).await?;
    Ok((StatusCode::CREATED, Json(SuccessEnvelope::new("Test in progress"))))
}

async fn get_status(State(server): State<StressorServer>) -> Response {
    let status = server.orchestrator.status().await;
    let code = if status.in_progress() {
        StatusCode::TOO_EARLY
    } else {
        StatusCode::OK
    };
    (code, [(header::CONTENT_TYPE, TEXT_PLAIN)], status.render()).into_response()
}

async fn get_hdr_histogram(State(server): State<StressorServer>) -> StressorResult<Response> {
    let plot = server.orchestrator.histogram_report().await?;
    Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], plot).into_response())
}
