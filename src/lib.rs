//! OI Monitor - option-chain open interest collector and delta dashboard
//!
//! Samples an option chain on a fixed interval, stores an ATM-windowed
//! snapshot of call/put open interest in SQLite and serves
//! period-over-period deltas to a dashboard over HTTP.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod sources;
pub mod state;

use api::ApiServer;
use config::AppConfig;
use error::Result;
use scheduler::{CaptureScheduler, RefreshScheduler};
use state::AppState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oi_monitor=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Run the collector, refresh loop and API server until Ctrl-C
pub async fn run(config: AppConfig) -> Result<()> {
    init_tracing();

    tracing::info!("Starting OI Monitor for {}...", config.symbol);
    config.validate()?;

    // Initialize application state
    let state = Arc::new(AppState::new(config)?);
    let source = sources::from_config(&state.config)?;

    let (stop_tx, stop_rx) = watch::channel(false);

    let capture = CaptureScheduler::new(source, state.clone()).start(stop_rx.clone());
    let refresh = RefreshScheduler::new(state.clone()).start(stop_rx);

    let mut server = ApiServer::new();
    if let Err(e) = server.start(state.clone()).await {
        tracing::error!("Failed to start API server: {}", e);
        let _ = stop_tx.send(true);
        let _ = tokio::join!(capture, refresh);
        return Err(e);
    }

    tracing::info!("Application started; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutdown requested, waiting for loops to finish");
    let _ = stop_tx.send(true);
    server.stop();

    let (capture, refresh) = tokio::join!(capture, refresh);
    if let Err(e) = capture {
        tracing::error!("Capture task ended abnormally: {}", e);
    }
    if let Err(e) = refresh {
        tracing::error!("Refresh task ended abnormally: {}", e);
    }

    tracing::info!("OI Monitor stopped");
    Ok(())
}
