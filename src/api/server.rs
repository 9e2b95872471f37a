//! HTTP server for the dashboard API
//!
//! Provides:
//! - Dashboard view with deltas (/api/oi/view)
//! - Recent rows and net-OI series (/api/oi/rows, /api/oi/net-series)
//! - Dashboard settings (/api/settings)

use crate::api::handlers;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    // Build CORS layer (allow all; the dashboard front end is served elsewhere)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ================================================================
        // Health check
        // ================================================================
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))

        // ================================================================
        // Open interest
        // ================================================================
        .route("/api/oi/view", get(handlers::get_view))
        .route("/api/oi/rows", get(handlers::get_rows))
        .route("/api/oi/net-series", get(handlers::get_net_series))

        // ================================================================
        // Settings
        // ================================================================
        .route(
            "/api/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )

        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Dashboard API server manager
#[derive(Default)]
pub struct ApiServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Create a new server
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the server on the configured host and port; returns the bound address
    pub async fn start(&mut self, state: Arc<AppState>) -> Result<SocketAddr> {
        let host = state.config.host.clone();
        let port = state.config.port;

        // Parse address
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address {}:{}: {}", host, port, e)))?;

        let app = router(state);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        // Spawn server task
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        });

        info!("Dashboard API listening on http://{}", local_addr);
        info!("  GET  http://{}/api/oi/view", local_addr);
        info!("  GET  http://{}/api/oi/rows", local_addr);
        info!("  GET  http://{}/api/oi/net-series", local_addr);
        info!("  GET  http://{}/api/settings", local_addr);
        info!("  POST http://{}/api/settings", local_addr);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}
