//! xjp-ds - Data service for the XJP56 fan site
//!
//! Serves the site document (`/data`), accepts image and audio uploads and
//! serves the uploads tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xjp_common::config::{load_toml_config, resolve_root_folder, ROOT_FOLDER_ENV};
use xjp_ds::{build_router, AppState, ServiceConfig};

/// Command-line arguments for xjp-ds
#[derive(Parser, Debug)]
#[command(name = "xjp-ds")]
#[command(about = "Data service for the XJP56 fan site")]
#[command(version)]
struct Args {
    /// Port to listen on (default 3001)
    #[arg(short, long, env = "XJP_DS_PORT")]
    port: Option<u16>,

    /// Address to bind (default 0.0.0.0)
    #[arg(long, env = "XJP_DS_HOST")]
    host: Option<String>,

    /// Root folder holding data/db.json and uploads/
    #[arg(short, long, env = "XJP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <root>/xjp-ds.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so its log level can apply
    let lookup_root = args
        .root_folder
        .clone()
        .unwrap_or_else(xjp_common::config::default_root_folder);
    let (toml, config_source) =
        load_toml_config(args.config.as_deref(), Some(lookup_root.as_path()));

    let level = toml.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("xjp_ds={level},xjp_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting XJP data service (xjp-ds) v{}", env!("CARGO_PKG_VERSION"));
    config_source.log();

    let root_folder = resolve_root_folder(
        args.root_folder.as_deref(),
        ROOT_FOLDER_ENV,
        toml.root_folder.as_deref(),
    );
    let config = ServiceConfig::from_toml(root_folder, &toml).with_overrides(args.host, args.port);
    info!("Root folder: {}", config.root_folder().display());

    let state = AppState::new(config.clone())
        .await
        .context("Failed to open document")?;
    info!("Document: {}", state.repository.path().display());
    info!("Uploads: {}", config.uploads_dir().display());

    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("xjp-ds listening on http://{}", addr);

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
