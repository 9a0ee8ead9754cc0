//! PlayStack Vocal Remover (playstack-vr) - Main entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use playstack_common::config::load_toml_config;
use playstack_common::SystemToolRunner;
use playstack_vr::config::{ServiceConfig, MODULE_NAME};
use playstack_vr::{build_router, AppState, BUILD_INFO};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for playstack-vr
#[derive(Parser, Debug)]
#[command(name = "playstack-vr")]
#[command(about = "Vocal remover: instrumental WAV from a YouTube link or upload")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/playstack/playstack-vr.toml)
    #[arg(short, long, env = "PLAYSTACK_VR_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "PLAYSTACK_VR_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PLAYSTACK_VR_PORT")]
    port: Option<u16>,

    /// Directory for per-request job directories
    #[arg(long, env = "PLAYSTACK_WORK_ROOT")]
    work_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut toml_config =
        load_toml_config(args.config.as_deref(), MODULE_NAME).context("Failed to load configuration")?;
    if args.host.is_some() {
        toml_config.host = args.host;
    }
    if args.port.is_some() {
        toml_config.port = args.port;
    }
    if args.work_root.is_some() {
        toml_config.work_root = args.work_root;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "playstack_vr={0},playstack_common={0},tower_http={0}",
                    toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} (git {}, built {}, {})",
        BUILD_INFO.module,
        BUILD_INFO.version,
        BUILD_INFO.short_hash(),
        BUILD_INFO.build_timestamp,
        BUILD_INFO.build_profile
    );

    let config = ServiceConfig::from_toml(&toml_config);
    std::fs::create_dir_all(&config.work_root)
        .with_context(|| format!("Failed to create work root {}", config.work_root.display()))?;
    info!("Work root: {}", config.work_root.display());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    let app = build_router(AppState::new(config, Arc::new(SystemToolRunner)));

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
