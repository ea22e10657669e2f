//! Instasite server entry point.
//!
//! Bootstraps the storage backend and the customization store, then starts
//! the Axum HTTP server with graceful shutdown. Queued writes are flushed
//! before the process exits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use instasite_core::persistence::PersistenceAdapter;
use instasite_core::store::CustomizationStore;
use instasite_server::build_router;
use instasite_server::config::{ServerConfig, StorageBackendType};
use instasite_server::state::AppState;
use instasite_storage::{FileBackend, MemoryBackend};

/// Upper bound on the final flush during shutdown.
const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?config.storage_backend, "Instasite starting");

    let adapter = build_adapter(&config)?;
    let store = Arc::new(CustomizationStore::with_defaults(adapter));
    store.load().await;

    let state = Arc::new(AppState::new(Arc::clone(&store)));
    let app = build_router(state);

    // Bind and serve.
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Instasite server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("flushing queued customization writes");
    match tokio::time::timeout(SHUTDOWN_FLUSH_TIMEOUT, store.flush()).await {
        Ok(true) => {}
        Ok(false) => warn!("last customization write was not persisted"),
        Err(_) => warn!("timed out waiting for customization writes"),
    }

    info!("Instasite server stopped");
    Ok(())
}

/// Open the configured storage backend.
fn build_adapter(config: &ServerConfig) -> anyhow::Result<PersistenceAdapter> {
    let adapter = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            PersistenceAdapter::new(Arc::new(MemoryBackend::new()))
        }
        StorageBackendType::File { path } => {
            info!(path = %path, "using file storage");
            PersistenceAdapter::new(Arc::new(FileBackend::new(path)))
        }
        #[cfg(feature = "redb-backend")]
        StorageBackendType::Redb { path } => {
            info!(path = %path, "using redb storage");
            PersistenceAdapter::new(Arc::new(
                instasite_storage::RedbBackend::open(path).context("failed to open redb storage")?,
            ))
        }
        #[cfg(not(feature = "redb-backend"))]
        StorageBackendType::Redb { .. } => {
            anyhow::bail!("redb backend requested but feature 'redb-backend' is not enabled");
        }
        StorageBackendType::None => {
            warn!("running without durable storage, customizations last until restart");
            PersistenceAdapter::unavailable()
        }
    };
    Ok(adapter)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
