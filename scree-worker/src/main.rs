//! scree PCA Worker - Main Entry Point
//!
//! A gRPC worker that holds one partition of a dataset and serves the
//! statistical rounds driven by the coordinator.
//!
//! Usage:
//!     scree-worker --port 7901
//!     scree-worker --address 0.0.0.0:7901 --data-dir data

use clap::Parser;
use scree_proto::worker_server::WorkerServer;
use scree_worker::WorkerNode;
use std::net::SocketAddr;
use tokio::signal;
use tonic::transport::Server;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "scree-worker")]
#[command(about = "scree PCA worker service")]
#[command(version)]
struct Args {
    /// gRPC server port
    #[arg(short, long, default_value = "7901")]
    port: u16,

    /// gRPC server address (overrides port)
    #[arg(short, long)]
    address: Option<String>,

    /// Directory holding partition and answer files
    #[arg(long, default_value = "data")]
    data_dir: String,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: Worker panicked");
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

    info!("Initializing scree worker");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    info!("  Data directory: {}", args.data_dir);

    let addr: SocketAddr = if let Some(address) = args.address {
        address
            .parse()
            .map_err(|e| format!("failed to parse address '{}': {}", address, e))?
    } else {
        format!("0.0.0.0:{}", args.port)
            .parse()
            .map_err(|e| format!("failed to parse port {}: {}", args.port, e))?
    };

    let node = WorkerNode::new(&args.data_dir);

    info!("Starting scree worker on {}", addr);

    // Scatter matrices grow quadratically in column count; allow 16MB messages
    Server::builder()
        .add_service(
            WorkerServer::new(node)
                .max_decoding_message_size(16 * 1024 * 1024)
                .max_encoding_message_size(16 * 1024 * 1024),
        )
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("Worker shutdown complete");
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
