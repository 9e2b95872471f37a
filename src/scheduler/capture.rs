//! Periodic option-chain capture
//!
//! Runs one capture cycle immediately, then one per poll interval. A
//! failed cycle is logged and the loop carries on. The stop signal is
//! only observed between cycles, so an append is never cut short.

use crate::error::AppError;
use crate::services::{CollectorService, CycleOutcome};
use crate::sources::PayloadSource;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Capture loop over one payload source
pub struct CaptureScheduler {
    source: Arc<dyn PayloadSource>,
    state: Arc<AppState>,
    interval: Duration,
}

impl CaptureScheduler {
    /// Create a capture scheduler using the configured poll interval
    pub fn new(source: Arc<dyn PayloadSource>, state: Arc<AppState>) -> Self {
        let interval = Duration::from_secs(state.config.poll_interval_secs);
        Self {
            source,
            state,
            interval,
        }
    }

    /// Start the capture loop; it exits once `stop` flips to `true`
    pub fn start(self, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Capture scheduler started (source={}, symbol={}, every {}s)",
                self.source.id(),
                self.state.config.symbol,
                self.interval.as_secs()
            );

            loop {
                if *stop.borrow() {
                    break;
                }

                self.run_cycle().await;

                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    changed = stop.changed() => {
                        // Sender dropped counts as a stop request
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Capture scheduler stopped");
        })
    }

    /// Run one cycle, logging instead of propagating failures
    pub async fn run_cycle(&self) -> Option<CycleOutcome> {
        let result = CollectorService::capture_once(
            self.source.as_ref(),
            self.state.store(),
            &self.state.clock,
            self.state.config.atm_range,
        )
        .await;

        match result {
            Ok(outcome) => {
                match &outcome {
                    CycleOutcome::Stored { captured_at, .. } => {
                        debug!("Capture stored at {}", captured_at);
                        // The next dashboard read should see this capture
                        self.state.invalidate_view();
                    }
                    CycleOutcome::Empty { expiry } => {
                        warn!("No strikes for expiry {}, nothing stored", expiry)
                    }
                }
                Some(outcome)
            }
            Err(e) if e.is_cycle_skip() => {
                warn!("Capture skipped: {}", e);
                None
            }
            Err(e @ AppError::StoreWrite(_)) => {
                error!("Snapshot not stored: {}", e);
                None
            }
            Err(e) => {
                error!("Capture cycle failed: {}", e);
                None
            }
        }
    }
}
