//! Stressor binary entry point

use clap::{Args, Parser, Subcommand};
use shared::{logging, process_info, spawn_heartbeat, HttpControlPlane, ProcessRole, Shutdown, StressTestSpec};
use shared::{instance_name, join_heartbeat, HEARTBEAT_INTERVAL};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use stressor::{ControlNotifier, StartClient, StatusNotifier, StressOrchestrator, StressorResult, StressorServer};

#[derive(Parser, Debug)]
#[command(name = "stressor")]
#[command(about = "Runs constant-pace stress tests and serves their reports")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LSD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Name reported to the control plane (falls back to POD_NAME)
    #[arg(long, global = true, env = "LSD_INSTANCE_NAME")]
    instance_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the API that runs stress tests
    Serve(ServeArgs),
    /// Ask a running stressor to start a test
    Start(StartArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind and wait for stress commands
    #[arg(long, env = "LSD_STRESS_SERVE_BIND", default_value = "127.0.0.1:9001")]
    bind: SocketAddr,

    /// Endpoint sent to the control plane when registering
    #[arg(long, env = "LSD_STRESSOR_SERVE_PUBLIC_ENDPOINT")]
    public_endpoint: String,

    /// Control plane base endpoint, empty disables registration
    #[arg(long, env = "LSD_STRESSOR_SERVE_CONTROL_ENDPOINT", default_value = "")]
    control_endpoint: String,
}

#[derive(Args, Debug)]
struct StartArgs {
    /// Base endpoint of the stressor that performs the test
    #[arg(long, default_value = "http://127.0.0.1:9001")]
    stressor: String,

    /// Target URL to stress
    #[arg(long)]
    target: String,

    /// HTTP method, defaults to GET on the stressor side
    #[arg(long, default_value = "")]
    method: String,

    /// How long the test lasts, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    duration_ms: u64,

    /// Constant pace to sustain
    #[arg(long, visible_aliases = ["rps", "rate"], default_value_t = 1_000)]
    requests_per_second: i64,

    /// Workers to start with, more are added to sustain the rate
    #[arg(long, default_value_t = 10)]
    workers: i64,
}

#[tokio::main]
async fn main() -> StressorResult<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let explicit = cli.instance_name.clone().or_else(|| std::env::var("POD_NAME").ok());
    let name = instance_name(explicit.as_deref());
    let role = ProcessRole::init(ProcessRole::Stressor(name.clone()));
    logging::init_tracing(Some(&cli.log_level));

    match cli.command {
        Command::Serve(args) => serve(role, name, args).await,
        Command::Start(args) => start(args).await,
    }
}

async fn serve(role: &'static ProcessRole, name: String, args: ServeArgs) -> StressorResult<()> {
    logging::log_startup(role, &format!("stressor on {}", args.bind));

    let shutdown = Shutdown::new();
    let notifier: Option<Arc<dyn StatusNotifier>> = if args.control_endpoint.trim().is_empty() {
        process_info!(role, "🔧 No control endpoint, registration disabled");
        None
    } else {
        let control = HttpControlPlane::new(&args.control_endpoint);
        Some(Arc::new(ControlNotifier::new(control, name, args.public_endpoint.clone())))
    };
    let registration_enabled = notifier.is_some();

    let orchestrator = Arc::new(StressOrchestrator::new(notifier, shutdown.listener()));
    let heartbeat = registration_enabled
        .then(|| spawn_heartbeat(orchestrator.clone(), HEARTBEAT_INTERVAL, shutdown.listener()));

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

    StressorServer::new(orchestrator).run(args.bind, shutdown.listener()).await?;

    if let Some(heartbeat) = heartbeat {
        join_heartbeat(heartbeat).await;
    }
    logging::log_success(role, "Stressor stopped gracefully");
    Ok(())
}

async fn start(args: StartArgs) -> StressorResult<()> {
    let spec = StressTestSpec {
        target: args.target,
        method: args.method,
        workers: args.workers,
        requests_per_second: args.requests_per_second,
        sustain: Duration::from_millis(args.duration_ms),
        ..Default::default()
    };
    StartClient::new(&args.stressor).start(&spec).await
}
