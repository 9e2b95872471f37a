//! Collector Service
//!
//! One capture cycle: pull a payload from the source, normalize it, build
//! the ATM-windowed snapshot and append it to the store.

use crate::clock::{today_ist, CaptureClock};
use crate::db::SnapshotStore;
use crate::error::{AppError, Result};
use crate::models::OptionChainSnapshot;
use crate::services::{normalizer, snapshot_builder};
use crate::sources::PayloadSource;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Result of a cycle that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A snapshot was appended
    Stored {
        captured_at: String,
        atm_strike: i64,
        rows: usize,
    },
    /// The payload was valid but had no items for the selected expiry
    Empty { expiry: String },
}

/// Collector service
pub struct CollectorService;

impl CollectorService {
    /// Normalize and build a snapshot without touching the store
    pub fn process_payload(
        payload: Option<&Value>,
        today: NaiveDate,
        atm_range: i64,
        captured_at: &str,
    ) -> Result<(String, Option<OptionChainSnapshot>)> {
        let chain = normalizer::normalize(payload, today)?;
        let snapshot = snapshot_builder::build_snapshot(&chain, atm_range, captured_at);
        Ok((chain.expiry, snapshot))
    }

    /// Run one capture cycle against today's IST date
    pub async fn capture_once(
        source: &dyn PayloadSource,
        store: Arc<dyn SnapshotStore>,
        clock: &CaptureClock,
        atm_range: i64,
    ) -> Result<CycleOutcome> {
        Self::capture_once_on(source, store, clock, atm_range, today_ist()).await
    }

    /// Run one capture cycle with an explicit "today"
    pub async fn capture_once_on(
        source: &dyn PayloadSource,
        store: Arc<dyn SnapshotStore>,
        clock: &CaptureClock,
        atm_range: i64,
        today: NaiveDate,
    ) -> Result<CycleOutcome> {
        let payload = source.fetch().await?;
        let captured_at = clock.next();

        let (expiry, snapshot) =
            Self::process_payload(payload.as_ref(), today, atm_range, &captured_at)?;

        let snapshot = match snapshot {
            Some(snapshot) if !snapshot.rows.is_empty() => snapshot,
            _ => return Ok(CycleOutcome::Empty { expiry }),
        };

        let atm_strike = snapshot.atm_strike;
        let rows = tokio::task::spawn_blocking(move || store.append(&snapshot))
            .await
            .map_err(|e| AppError::Internal(format!("Store task failed: {}", e)))??;

        info!("ATM={} | Rows={}", atm_strike, rows);

        Ok(CycleOutcome::Stored {
            captured_at,
            atm_strike,
            rows,
        })
    }
}
