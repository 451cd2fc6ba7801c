//! Handler worker entry point

use clap::Parser;
use shared::{instance_name, logging, process_info, spawn_heartbeat, HttpControlPlane, ProcessRole, Shutdown};
use shared::{join_heartbeat, normalize_endpoint, HEARTBEAT_INTERVAL};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use handler::{ForwardingHandler, HandlerError, HandlerResult, HandlerServer, RegistrationHeartbeat, ServiceDirectory};

#[derive(Parser, Debug)]
#[command(name = "handler")]
#[command(about = "Worker that serves requests and calls other registered services")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LSD_SERVE_BIND", default_value = "127.0.0.1:9000")]
    bind: SocketAddr,

    /// Service this worker provides
    #[arg(long, env = "LSD_SERVE_SERVICE", default_value = "frontend")]
    service: String,

    /// Endpoint other processes use to reach this worker, defaults to http://<bind>
    #[arg(long, env = "LSD_SERVE_PUBLIC_ENDPOINT")]
    public_endpoint: Option<String>,

    /// Control plane base endpoint, empty disables registration
    #[arg(long, env = "LSD_SERVE_CONTROL_ENDPOINT", default_value = "")]
    control_endpoint: String,

    /// Instance name (falls back to POD_NAME)
    #[arg(long, env = "LSD_INSTANCE_NAME")]
    instance_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LSD_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> HandlerResult<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let explicit = args.instance_name.clone().or_else(|| std::env::var("POD_NAME").ok());
    let name = instance_name(explicit.as_deref());
    let role = ProcessRole::init(ProcessRole::Handler(name.clone()));
    logging::init_tracing(Some(&args.log_level));

    let public_endpoint = args
        .public_endpoint
        .clone()
        .unwrap_or_else(|| format!("http://{}", args.bind));
    let public_endpoint = normalize_endpoint(&public_endpoint)
        .map_err(|e| HandlerError::config(format!("Invalid public endpoint: {e}")))?;
    logging::log_startup(role, &format!("{} handler on {} ({})", args.service, args.bind, public_endpoint));

    let directory = Arc::new(ServiceDirectory::new(&public_endpoint));
    let server = HandlerServer::new(ForwardingHandler::new(), directory.clone());
    let shutdown = Shutdown::new();

    let heartbeat = if args.control_endpoint.trim().is_empty() {
        process_info!(role, "🔧 No control endpoint, registration disabled");
        None
    } else {
        let registration = RegistrationHeartbeat::new(
            HttpControlPlane::new(&args.control_endpoint),
            name,
            &args.service,
            &public_endpoint,
            server.request_counter(),
            directory,
        );
        Some(spawn_heartbeat(Arc::new(registration), HEARTBEAT_INTERVAL, shutdown.listener()))
    };

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

    if let Some(heartbeat) = heartbeat {
        join_heartbeat(heartbeat).await;
    }
    process_info!(role, requests = server.requests_served(), "👋 Handler drained all connections");
    logging::log_success(role, "Handler stopped gracefully");
    Ok(())
}
