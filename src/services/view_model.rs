//! View Model Assembler
//!
//! Merges the current snapshot, its deltas and the display ATM into one
//! row per strike for the presentation layer.

use crate::models::{DeltaMode, DeltaValue, Sign, StoredRow};
use crate::services::atm::AtmPolicy;
use crate::services::delta_engine::{DeltaReport, StoredSnapshot};
use serde::Serialize;
use std::collections::BTreeMap;

pub const NO_DATA_MESSAGE: &str = "No data yet. Let collector run.";

/// One display row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub time: String,
    pub expiry: String,
    pub strike: i64,
    pub ce_oi: i64,
    /// Upstream-reported change, passed through untouched
    pub ce_oi_change: i64,
    pub pe_oi: i64,
    /// Upstream-reported change, passed through untouched
    pub pe_oi_change: i64,
    pub net_oi: i64,
    pub ce_delta: DeltaValue,
    pub pe_delta: DeltaValue,
    pub ce_sign: Sign,
    pub pe_sign: Sign,
    pub is_atm: bool,
}

/// Headline metrics for the ATM strike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub atm_strike: i64,
    pub atm_policy: AtmPolicy,
    pub current_ce_oi: i64,
    pub current_pe_oi: i64,
    pub ce_delta_for_atm: DeltaValue,
    pub pe_delta_for_atm: DeltaValue,
}

/// Complete dashboard view for one refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub captured_at: String,
    /// `None` when only one capture exists (zero baseline)
    pub previous_captured_at: Option<String>,
    pub expiry: String,
    pub delta_mode: DeltaMode,
    pub summary: Option<SummaryMetrics>,
    /// Ascending by strike
    pub rows: Vec<ViewRow>,
}

/// What the presentation layer renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardState {
    NoData { message: String },
    Ready(DashboardView),
}

impl DashboardState {
    pub fn no_data() -> Self {
        DashboardState::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        }
    }
}

/// Mean net OI at one capture time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetOiPoint {
    pub time: String,
    pub net_oi: f64,
}

/// Assemble the display rows for `current`
pub fn assemble(current: &StoredSnapshot, previous_time: Option<&str>, report: &DeltaReport) -> DashboardView {
    let atm_strike = report.atm.map(|atm| atm.strike);

    let mut rows: Vec<ViewRow> = report
        .rows
        .iter()
        .map(|delta| ViewRow {
            time: current.time.clone(),
            expiry: current.expiry.clone(),
            strike: delta.current.strike,
            ce_oi: delta.current.ce_oi,
            ce_oi_change: delta.current.ce_oi_change,
            pe_oi: delta.current.pe_oi,
            pe_oi_change: delta.current.pe_oi_change,
            net_oi: delta.current.net_oi,
            ce_delta: delta.ce_delta,
            pe_delta: delta.pe_delta,
            ce_sign: delta.ce_sign,
            pe_sign: delta.pe_sign,
            is_atm: Some(delta.current.strike) == atm_strike,
        })
        .collect();
    rows.sort_by_key(|row| row.strike);

    let summary = report.atm.and_then(|atm| {
        let delta = report.row_for(atm.strike)?;
        Some(SummaryMetrics {
            atm_strike: atm.strike,
            atm_policy: atm.policy,
            current_ce_oi: delta.current.ce_oi,
            current_pe_oi: delta.current.pe_oi,
            ce_delta_for_atm: delta.ce_delta,
            pe_delta_for_atm: delta.pe_delta,
        })
    });

    DashboardView {
        captured_at: current.time.clone(),
        previous_captured_at: previous_time.map(str::to_string),
        expiry: current.expiry.clone(),
        delta_mode: report.mode,
        summary,
        rows,
    }
}

/// Mean `net_oi` per capture time, ascending by time
pub fn net_oi_series(rows: &[StoredRow]) -> Vec<NetOiPoint> {
    let mut by_time: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = by_time.entry(row.time.as_str()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(row.net_oi);
        entry.1 += 1;
    }

    by_time
        .into_iter()
        .map(|(time, (sum, count))| NetOiPoint {
            time: time.to_string(),
            net_oi: sum as f64 / count as f64,
        })
        .collect()
}
