//! triple-s -- simple S3-style object storage server.
//!
//! Crash-only design: every startup is a recovery. The catalogs are
//! rebuilt from their CSV files on open, and SIGTERM/SIGINT only stop
//! accepting connections -- no cleanup pass.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

/// Command-line arguments for the triple-s server.
#[derive(Parser, Debug)]
#[command(
    name = "triple-s",
    version,
    about = "Simple S3-style object storage server"
)]
struct Cli {
    /// Path to an optional YAML configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on (default 8080).
    #[arg(long)]
    port: Option<u16>,

    /// Root directory for catalogs and object files (default ./data).
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing / logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {path}");
            triple_s::config::load_config(path)?
        }
        None => triple_s::config::Config::default(),
    };

    // CLI flags take precedence over the config file.
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.dir {
        config.storage.root = dir;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(triple_s::AppState::new(config)?);
    info!(
        "Catalogs opened under {}",
        state.catalogs.root().display()
    );

    let app = triple_s::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("triple-s listening on {bind_addr}");

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections,
    // wait for in-flight requests to complete, then exit.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("triple-s shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
