/// Main entry point for the rs_webssh server
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use rs_webssh::app_state::AppState;
use rs_webssh::config::{ConfigLoader, init_logging};
use rs_webssh::pty::SshShellConnector;
use rs_webssh::server::{build_router, run_server_with_graceful_shutdown};
use rs_webssh::store::{CredentialStore, spawn_sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Load configuration; an explicit path is the first argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ConfigLoader::new()
        .load_config(config_path.as_deref())
        .context("Failed to load configuration")?;

    // Initialize logging; the guard flushes file output on exit
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    for dir in [&config.transfer.download_dir, &config.transfer.upload_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let store = CredentialStore::open(&config.store.path).context("Failed to open credential store")?;
    let sweeper = spawn_sweeper(
        store.clone(),
        Duration::from_secs(config.store.sweep_interval_secs),
        Duration::from_secs(config.store.max_age_secs),
    );

    let server_config = config.server.clone();
    let app_state = AppState::new(config, store, Arc::new(SshShellConnector::default()));
    let registry = app_state.registry.clone();

    let app = build_router(app_state);
    let served = run_server_with_graceful_shutdown(app, &server_config).await;

    sweeper.abort();
    let closed = registry.shutdown().await;
    info!("Closed {} remote sessions", closed);

    if let Err(e) = &served {
        warn!("Server stopped with error: {}", e);
    }
    served.context("Server error")
}
