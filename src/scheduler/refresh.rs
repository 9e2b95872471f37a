//! Dashboard refresh loop
//!
//! Recomputes the dashboard view on the operator-selected interval and
//! caches it in `AppState`. Settings are re-read every tick so interval
//! and delta-mode changes take effect without a restart.

use crate::config::DEFAULT_REFRESH_INTERVAL_SECS;
use crate::error::{AppError, Result};
use crate::services::view_model::DashboardState;
use crate::services::DashboardService;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Refresh scheduler for the cached dashboard view
pub struct RefreshScheduler {
    state: Arc<AppState>,
}

impl RefreshScheduler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the refresh loop; it exits once `stop` flips to `true`
    pub fn start(self, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Dashboard refresh scheduler started");

            loop {
                if *stop.borrow() {
                    break;
                }

                let interval = match refresh_once(&self.state).await {
                    Ok(secs) => Duration::from_secs(secs),
                    Err(e) => {
                        error!("Dashboard refresh failed: {}", e);
                        Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS)
                    }
                };

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Dashboard refresh scheduler stopped");
        })
    }
}

/// Recompute and cache the view; returns the refresh interval to wait
pub async fn refresh_once(state: &Arc<AppState>) -> Result<u64> {
    let (view, interval) = compute_view(state).await?;
    state.set_cached_view(view);
    Ok(interval)
}

/// Compute the view from current settings without caching it
pub async fn compute_view(state: &Arc<AppState>) -> Result<(DashboardState, u64)> {
    let sqlite = state.sqlite.clone();

    tokio::task::spawn_blocking(move || -> Result<(DashboardState, u64)> {
        let settings = sqlite.get_settings()?;
        let view = DashboardService::load_view(
            sqlite.as_ref(),
            settings.delta_mode,
            settings.expiry_filter.as_deref(),
        )?;
        Ok((view, settings.refresh_interval_secs))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Refresh task failed: {}", e)))?
}
