//! nh-mt (Music Therapy) - EEG-driven music recommendation service
//!
//! Startup order: config, tracing, build identification, root folder and
//! database, catalog seeding, classifier, HTTP server.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nh_common::classify::load_classifier;
use nh_common::config::{load_module_config, RootFolderInitializer, RootFolderResolver, TomlConfig};
use nh_common::db::{init_database, seed_catalog, SqliteStore, TherapyStore};
use nh_common::PipelineContext;
use nh_mt::{build_router, AppState, ServiceSettings};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const MODULE_NAME: &str = "nh-mt";

/// Default model file name inside the root folder
const MODEL_FILE_NAME: &str = "model.json";

/// Command-line arguments for nh-mt
#[derive(Parser, Debug)]
#[command(name = "nh-mt")]
#[command(about = "NeuroHarmony music therapy service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "NH_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and model
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Pre-trained model artifact (JSON)
    #[arg(short, long, env = "NH_MODEL")]
    model: Option<PathBuf>,
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.logging.level)));

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_module_config(MODULE_NAME);
    init_tracing(&config)?;

    info!(
        "Starting NeuroHarmony Music Therapy (nh-mt) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder.clone());
    initializer.ensure_directory_exists()?;
    info!("Root folder: {}", root_folder.display());

    let db_path = initializer.database_path();
    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database {}: {}", db_path.display(), e);
            return Err(e.into());
        }
    };

    let store = Arc::new(SqliteStore::new(
        pool,
        Duration::from_millis(config.store_timeout_ms),
    ));
    if !store.health_check().await {
        warn!(
            "Storage health check failed: {}",
            store.last_error().unwrap_or_default()
        );
    }
    if config.seed_catalog {
        seed_catalog(store.as_ref()).await;
    }

    let model_path = args
        .model
        .or_else(|| config.model_path.clone())
        .unwrap_or_else(|| root_folder.join(MODEL_FILE_NAME));
    let classifier = load_classifier(Some(model_path.as_path()));
    if classifier.is_none() {
        info!("Scoring only: classification disabled until a model is provided");
    }

    let state = AppState::new(
        PipelineContext::new(classifier),
        store,
        ServiceSettings::from_config(&config),
    );
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("nh-mt listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
