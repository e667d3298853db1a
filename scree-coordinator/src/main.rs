//! scree PCA Coordinator - Main Entry Point
//!
//! Dials the worker fleet, owns the job queue and serves the JSON
//! submission API.
//!
//! Usage:
//!     scree-coordinator --listen 127.0.0.1:8000 --workers 127.0.0.1:7901,127.0.0.1:7902
//!     scree-coordinator --components 2 --save-scores

use clap::Parser;
use scree_coordinator::api::{self, ApiState};
use scree_coordinator::orchestrator::Orchestrator;
use scree_coordinator::pool::WorkerPool;
use scree_coordinator::queue;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "scree-coordinator")]
#[command(about = "scree PCA coordinator service")]
#[command(version)]
struct Args {
    /// HTTP listen address
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    listen: String,

    /// Comma-separated worker gRPC addresses
    #[arg(short, long, default_value = "127.0.0.1:7901,127.0.0.1:7902")]
    workers: String,

    /// Queue poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// Number of principal components to select
    #[arg(long, default_value = "2")]
    components: usize,

    /// Ship the component basis back so workers write score files
    #[arg(long)]
    save_scores: bool,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: Coordinator panicked");
        eprintln!(
            "  Location: {}",
            panic_info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        eprintln!(
            "  Message: {}",
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .unwrap_or(&"<no message>")
        );
    }));

    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("Initializing scree coordinator");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    info!("  Components: {}", args.components);
    info!("  Save scores: {}", args.save_scores);

    let addr: SocketAddr = args
        .listen
        .parse()
        .map_err(|e| format!("failed to parse listen address '{}': {}", args.listen, e))?;

    let worker_addrs: Vec<String> = args
        .workers
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if worker_addrs.is_empty() {
        return Err("no worker addresses configured".into());
    }

    // The whole fleet must be reachable before any job can run
    let pool = WorkerPool::connect(&worker_addrs).await?;
    info!("Connected to {} workers", pool.len());

    let orchestrator = Orchestrator::new(pool, args.components, args.save_scores);
    let (job_queue, poller) = queue::channel(Duration::from_millis(args.poll_interval_ms.max(1)));
    tokio::spawn(poller.run(orchestrator));

    let app = api::router(ApiState { queue: job_queue });

    info!("Starting scree coordinator on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Coordinator shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
