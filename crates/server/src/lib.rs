//! Gepetinho Chat Server Library
//!
//! Token-authenticated chat API backed by a pluggable conversation store
//! and an external completion provider.

pub mod ai;
pub mod auth;
pub mod chat;
pub mod config;
pub mod ctx;
pub mod error;
pub mod models;
pub mod router;
pub mod store;
pub mod token;

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai::{CompletionProvider, GenAiProvider};
use config::{AppState, ServerConfig, StoreKind};
use store::{ConversationStore, MemoryStore, SqliteStore};

pub use error::{Error, Result};
pub use router::router;

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    info!("=== Gepetinho Server ===");

    let config = ServerConfig::from_env()?;
    info!("Mode: {:?}", config.mode);

    let store: Arc<dyn ConversationStore> = match config.store {
        StoreKind::Sqlite => {
            tokio::fs::create_dir_all(&config.data_dir).await?;
            Arc::new(SqliteStore::open(&config.database_path()).await?)
        }
        StoreKind::Memory => {
            info!("Using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let provider: Arc<dyn CompletionProvider> = Arc::new(GenAiProvider::new(&config.ai));
    let app_state = AppState::new(&config, store, provider);
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Gepetinho server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
