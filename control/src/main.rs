//! Control-plane process entry point

use clap::Parser;
use shared::{logging, process_info, ProcessRole, Shutdown};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use control::{ControlPlaneServer, ControlResult, HttpStressTrigger, RegistryStore};

#[derive(Parser, Debug)]
#[command(name = "control")]
#[command(about = "Service registry, liveness tracker and stress-test dashboard")]
struct Args {
    /// Address the HTTP server binds to
    #[arg(long, env = "LSD_CONTROL_PLANE_BIND", default_value = "127.0.0.1:9002")]
    bind: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LSD_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ControlResult<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let role = ProcessRole::init(ProcessRole::ControlPlane);
    logging::init_tracing(Some(&args.log_level));
    logging::log_startup(role, &format!("control plane on {}", args.bind));

    let server = ControlPlaneServer::new(Arc::new(RegistryStore::new()), HttpStressTrigger::new());

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(ProcessRole::current(), "Received Ctrl+C signal");
                signal_shutdown.trigger();
            }
            Err(err) => {
                logging::log_error(ProcessRole::current(), "Signal handling", &err);
            }
        }
    });

    server.run(args.bind, shutdown.listener()).await?;

    process_info!(role, "👋 Control plane drained all connections");
    logging::log_success(role, "Control plane stopped gracefully");
    Ok(())
}
