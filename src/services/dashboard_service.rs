//! Dashboard Service
//!
//! Read path for one refresh: latest two capture events from the store,
//! delta engine, view model. Store calls are synchronous; async callers
//! run these inside `spawn_blocking`.

use crate::db::SnapshotStore;
use crate::error::Result;
use crate::models::{DeltaMode, StoredRow};
use crate::services::delta_engine::{self, StoredSnapshot};
use crate::services::view_model::{self, DashboardState, NetOiPoint};

/// Rows shown in the recent-data table and used for the net-OI chart
pub const RECENT_ROWS_LIMIT: usize = 500;

/// Dashboard service
pub struct DashboardService;

impl DashboardService {
    /// Build the current dashboard state
    ///
    /// With an expiry filter only captures of that expiry are compared.
    pub fn load_view(
        store: &dyn SnapshotStore,
        mode: DeltaMode,
        expiry_filter: Option<&str>,
    ) -> Result<DashboardState> {
        let times = match active_expiry(expiry_filter) {
            Some(expiry) => store.distinct_capture_times_for_expiry(expiry, 2)?,
            None => store.distinct_capture_times(2)?,
        };

        let Some(current_time) = times.first() else {
            return Ok(DashboardState::no_data());
        };

        let current = Self::load_snapshot(store, current_time)?;
        let previous = match times.get(1) {
            Some(time) => Some(Self::load_snapshot(store, time)?),
            None => None,
        };

        let report = delta_engine::run(&current, previous.as_ref(), mode);
        let view = view_model::assemble(
            &current,
            previous.as_ref().map(|p| p.time.as_str()),
            &report,
        );

        tracing::debug!(
            "Dashboard view at {} ({} rows, previous {:?})",
            view.captured_at,
            view.rows.len(),
            view.previous_captured_at
        );

        Ok(DashboardState::Ready(view))
    }

    /// Most recent rows, ascending by time then strike
    pub fn recent_rows(
        store: &dyn SnapshotStore,
        limit: usize,
        expiry_filter: Option<&str>,
    ) -> Result<Vec<StoredRow>> {
        let mut rows = Self::latest_rows(store, limit, expiry_filter)?;
        rows.sort_by(|a, b| a.time.cmp(&b.time).then(a.strike.cmp(&b.strike)));
        Ok(rows)
    }

    /// Mean net OI per capture time over the most recent rows
    pub fn net_oi_series(
        store: &dyn SnapshotStore,
        limit: usize,
        expiry_filter: Option<&str>,
    ) -> Result<Vec<NetOiPoint>> {
        let rows = Self::latest_rows(store, limit, expiry_filter)?;
        Ok(view_model::net_oi_series(&rows))
    }

    fn latest_rows(
        store: &dyn SnapshotStore,
        limit: usize,
        expiry_filter: Option<&str>,
    ) -> Result<Vec<StoredRow>> {
        match active_expiry(expiry_filter) {
            Some(expiry) => store.latest_rows_for_expiry(expiry, limit),
            None => store.latest_rows(limit),
        }
    }

    fn load_snapshot(store: &dyn SnapshotStore, time: &str) -> Result<StoredSnapshot> {
        let rows = store.rows_at(time)?;
        let info = store.capture_info(time)?;

        let expiry = match &info {
            Some(info) => info.expiry.clone(),
            None => rows.first().map(|r| r.expiry.clone()).unwrap_or_default(),
        };

        Ok(StoredSnapshot {
            time: time.to_string(),
            expiry,
            reference_price: info.map(|i| i.underlying_value),
            rows: rows.iter().map(StoredRow::strike_row).collect(),
        })
    }
}

// Blank filter means every expiry
fn active_expiry(expiry_filter: Option<&str>) -> Option<&str> {
    expiry_filter.map(str::trim).filter(|e| !e.is_empty())
}
