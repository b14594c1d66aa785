//! Nutrilog Store Server
//!
//! Serves the nutrilog JSON tree to the CLI and other clients.
//!
//! # Configuration
//!
//! Environment variables:
//! - `NUTRILOG_PORT`: Port to listen on (default: 8080)
//! - `NUTRILOG_DATA_DIR`: Directory holding `tree.json` (default: ~/.local/share/nutrilog-server)
//! - `NUTRILOG_CONFIG`: Path to config file (default: ~/.config/nutrilog-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     user_id: "user1"
//! ```

use nutrilog::server::{router, ApiKeyStore, AppState, Config};
use nutrilog_core::FileStore;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutrilog_server=info,nutrilog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let store = match FileStore::open(config.store_path()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };
    let api_keys = ApiKeyStore::load(&config.config_path);

    let app = router(AppState::new(store, api_keys));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
