//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration (one handler for every method and path)
//! - Middleware stack (request IDs, request logging, tracing)
//! - Optional Prometheus exporter
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::unzip_key;
use crate::state::ServerState;
use axum::middleware::from_fn;
use axum::routing::any;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the Axum router
///
/// `/` accepts every method, and every other path falls back to the same
/// handler.
///
/// Middleware stack (outermost first):
/// 1. Tracing spans
/// 2. Request ID tracking
/// 3. Request logging
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", any(unzip_key))
        .fallback(unzip_key)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the zipgate HTTP server
///
/// Initializes logging and metrics from `config`, binds the configured
/// address, and serves until SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    if let Some(metrics_addr) = config.metrics_socket_addr()? {
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        tracing::info!("Metrics exporter on {}", metrics_addr);
    }

    let addr: SocketAddr = config.socket_addr()?;
    tracing::info!(
        "Release delay: {}s, archives: {} -> {}",
        config.release_delay_secs,
        config.archive.source_dir.display(),
        config.archive.dest_dir.display()
    );

    let state = Arc::new(ServerState::new(config));
    let listener = TcpListener::bind(addr).await?;

    serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve requests on an already bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    tracing::info!("Listening on: {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
