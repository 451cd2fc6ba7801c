//! Manager process entry point

use clap::Parser;
use shared::{logging, process_info, ProcessRole, Shutdown};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use manager::{CodeBase, ManagerResult, ManagerServer};

#[derive(Parser, Debug)]
#[command(name = "manager")]
#[command(about = "Hands out the code every service type of the fleet runs")]
struct Args {
    /// Address the HTTP server binds to
    #[arg(long, env = "LSD_MANAGER_BIND", default_value = "127.0.0.1:9003")]
    bind: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LSD_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ManagerResult<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let role = ProcessRole::init(ProcessRole::Manager);
    logging::init_tracing(Some(&args.log_level));
    logging::log_startup(role, &format!("manager on {}", args.bind));

    let server = ManagerServer::new(Arc::new(CodeBase::new()));

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

    process_info!(role, service_types = server.codebase().len().await, "👋 Manager drained all connections");
    logging::log_success(role, "Manager stopped gracefully");
    Ok(())
}
