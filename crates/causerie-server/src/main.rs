//! # causerie-server
//!
//! Multi-channel real-time chat relay.
//!
//! This binary provides:
//! - **WebSocket relay**: clients join named channels, exchange text/media
//!   messages and like them; events fan out to the channel's current members
//! - **Durable history**: every channel keeps its last 100 messages in a
//!   JSON snapshot rewritten by a background task on each mutation
//! - **Flat-file directory** for register/login and the public server list
//! - **Upload API** (axum multipart) returning `/uploads/...` URLs that
//!   messages reference opaquely
//! - **Static serving** of the bundled client assets

mod api;
mod config;
mod error;
mod router;
mod session;
mod state;
mod upload;
mod ws;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use causerie_store::directory::Directory;
use causerie_store::snapshot::load_or_seed;
use causerie_store::{ChannelHistories, DocumentWriter};

use crate::config::ServerConfig;
use crate::router::Router;
use crate::state::AppState;
use crate::upload::UploadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,causerie_server=debug")),
        )
        .init();

    info!("Starting Causerie chat relay v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    tokio::fs::create_dir_all(&config.data_dir).await?;

    // -----------------------------------------------------------------------
    // 3. Load persisted state (self-healing on missing/corrupt files)
    // -----------------------------------------------------------------------
    let histories: ChannelHistories =
        load_or_seed(&config.history_path(), ChannelHistories::bootstrap).await;
    let directory: Directory = load_or_seed(&config.directory_path(), Directory::bootstrap).await;

    info!(
        channels = histories.list().len(),
        implicit_channels = config.implicit_channels,
        "Chat state loaded"
    );

    // -----------------------------------------------------------------------
    // 4. Spawn background snapshot writers
    // -----------------------------------------------------------------------
    let history_writer = DocumentWriter::spawn(config.history_path());
    let directory_writer = DocumentWriter::spawn(config.directory_path());

    // -----------------------------------------------------------------------
    // 5. Build the router and application state
    // -----------------------------------------------------------------------
    let router = Arc::new(Router::new(
        histories,
        directory,
        history_writer,
        directory_writer,
        config.implicit_channels,
    ));

    let uploads = Arc::new(
        UploadStore::new(config.uploads_dir.clone(), config.max_upload_size).await?,
    );

    let state = AppState {
        router,
        uploads,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 6. Run the HTTP/WebSocket server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
