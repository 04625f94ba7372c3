//! HTTP server for the error-page editor and example pages.
//!
//! Routes (all under the configured URL prefix):
//! - `GET /health` - Liveness check, `204 No Content`
//! - `GET /examples[/]` - The `default` example
//! - `GET /examples/{name}` - A named example, rendered with status 500
//! - `GET /editor/...` - Static editor files

pub mod app;
pub mod config;
pub mod logging;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

pub use app::{router, AppState};
pub use config::{Overrides, ServerConfig};
pub use logging::LogFormat;

/// Bind and serve until Ctrl+C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::from_config(&config)?;

    match state.resolver().cache().store().list() {
        Ok(keys) => tracing::info!(
            dir = %config.examples.dir.display(),
            count = keys.len(),
            examples = ?keys,
            "parameter store ready"
        ),
        Err(e) => tracing::warn!(
            dir = %config.examples.dir.display(),
            error = %e,
            "parameter store directory is not readable; every example will 404"
        ),
    }

    let app = router(state, &config);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        prefix = %config.server.url_prefix,
        edge_cache = config.examples.edge_cache,
        "listening"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}
