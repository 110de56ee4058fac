/// HTTP server for rs_webssh
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::{app_state::AppState, handlers};

/// Build the application router with routes
pub fn build_router(state: AppState) -> Router {
    // Create CORS layer to allow cross-origin requests
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "rs_webssh - remote files and terminal over SSH" }))
        .route("/health", get(handlers::rest::health_check))
        // WebSocket endpoint for terminal communication
        .route("/terminal", get(handlers::websocket::terminal_handler))
        .merge(api_routes())
        .layer(cors)
        .with_state(state)
}

/// File management API, addressed by `hostIp` + `username`
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::rest::login))
        .route("/logout", post(handlers::rest::logout))
        .route("/listFiles", post(handlers::rest::list_files))
        // Uploads are streamed to disk, so the default body limit does not apply
        .route(
            "/uploadfile",
            post(handlers::rest::upload_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/getFile", post(handlers::rest::get_file))
        .route("/mkdir", post(handlers::rest::mkdir))
        .route("/remove", post(handlers::rest::remove))
        .route("/rename", post(handlers::rest::rename))
        .route("/getHistory", post(handlers::rest::get_history))
        .route("/getDf", post(handlers::rest::get_df))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM signal, initiating graceful shutdown...");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the HTTP server with graceful shutdown support
pub async fn run_server_with_graceful_shutdown(
    router: Router,
    config: &ServerConfig,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr: SocketAddr = listener.local_addr()?;

    info!("Server running on http://{}", addr);
    info!("Terminal WebSocket available at ws://{}/terminal", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
