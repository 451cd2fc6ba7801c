//! Main control-plane server implementation
//!
//! `ControlPlaneServer` owns the registry and the stress trigger, and wires
//! them into an axum router. The trigger is injected so tests can swap in a
//! mock.

use axum::routing::{get, post, put};
use axum::Router;
use shared::{process_info, ProcessRole, ShutdownListener};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::RegistryStore;
use crate::error::{ControlError, ControlResult};
use crate::traits::StressTrigger;
use crate::web::api;

/// Control-plane server with dependency injection
pub struct ControlPlaneServer<T>
where
    T: StressTrigger,
{
    registry: Arc<RegistryStore>,
    trigger: Arc<T>,
}

// manual impl: T itself need not be Clone
impl<T: StressTrigger> Clone for ControlPlaneServer<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            trigger: self.trigger.clone(),
        }
    }
}

impl<T> ControlPlaneServer<T>
where
    T: StressTrigger + 'static,
{
    pub fn new(registry: Arc<RegistryStore>, trigger: T) -> Self {
        Self {
            registry,
            trigger: Arc::new(trigger),
        }
    }

    pub fn registry(&self) -> &Arc<RegistryStore> {
        &self.registry
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(api::get_dashboard::<T>))
            .route("/static/styles/:style", get(api::get_style))
            .route("/registry", get(api::get_registry::<T>))
            .route("/register/service/:service", put(api::register_service::<T>))
            .route("/register/stressor/:name", put(api::register_stressor::<T>))
            .route("/register/instance/:name", put(api::register_instance::<T>))
            .route("/actions/trigger-stressor/:name", post(api::trigger_stressor::<T>))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Bind `addr` and serve until `shutdown` fires
    pub async fn run(&self, addr: SocketAddr, shutdown: ShutdownListener) -> ControlResult<()> {
        let listener = TcpListener::bind(addr).await.map_err(|e| ControlError::ServerStartup {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires
    pub async fn serve(&self, listener: TcpListener, shutdown: ShutdownListener) -> ControlResult<()> {
        let local = listener.local_addr()?;
        process_info!(ProcessRole::current(), "🌐 Control plane listening on http://{}", local);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;
        Ok(())
    }
}
