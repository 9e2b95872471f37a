//! Snapshot and row models shared by the write and read paths

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flattened call/put open interest for one strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeRow {
    pub strike: i64,
    pub ce_oi: i64,
    pub ce_oi_change: i64,
    pub pe_oi: i64,
    pub pe_oi_change: i64,
    /// `pe_oi - ce_oi`, positive when puts dominate
    pub net_oi: i64,
}

impl StrikeRow {
    pub fn new(strike: i64, ce_oi: i64, ce_oi_change: i64, pe_oi: i64, pe_oi_change: i64) -> Self {
        Self {
            strike,
            ce_oi,
            ce_oi_change,
            pe_oi,
            pe_oi_change,
            net_oi: pe_oi.saturating_sub(ce_oi),
        }
    }

    /// Row used when a strike has no counterpart in the previous snapshot
    pub fn zero(strike: i64) -> Self {
        Self::new(strike, 0, 0, 0, 0)
    }
}

/// One capture event, windowed around ATM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub captured_at: String,
    pub expiry: String,
    pub underlying_value: f64,
    pub atm_strike: i64,
    /// Ascending by strike, strikes unique
    pub rows: Vec<StrikeRow>,
}

/// A persisted `oi_data` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub time: String,
    pub expiry: String,
    pub strike: i64,
    pub ce_oi: i64,
    pub ce_oi_change: i64,
    pub pe_oi: i64,
    pub pe_oi_change: i64,
    pub net_oi: i64,
}

impl StoredRow {
    pub fn from_snapshot_row(time: &str, expiry: &str, row: &StrikeRow) -> Self {
        Self {
            time: time.to_string(),
            expiry: expiry.to_string(),
            strike: row.strike,
            ce_oi: row.ce_oi,
            ce_oi_change: row.ce_oi_change,
            pe_oi: row.pe_oi,
            pe_oi_change: row.pe_oi_change,
            net_oi: row.net_oi,
        }
    }

    pub fn strike_row(&self) -> StrikeRow {
        StrikeRow {
            strike: self.strike,
            ce_oi: self.ce_oi,
            ce_oi_change: self.ce_oi_change,
            pe_oi: self.pe_oi,
            pe_oi_change: self.pe_oi_change,
            net_oi: self.net_oi,
        }
    }
}

/// Per-capture metadata persisted alongside the rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureInfo {
    pub time: String,
    pub expiry: String,
    pub underlying_value: f64,
    pub atm_strike: i64,
    pub row_count: i64,
}

/// How period-over-period deltas are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    #[default]
    Absolute,
    Percentage,
}

impl FromStr for DeltaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absolute" | "abs" => Ok(DeltaMode::Absolute),
            "percentage" | "percent" | "pct" => Ok(DeltaMode::Percentage),
            other => Err(format!(
                "Invalid delta mode '{}'. Use 'absolute' or 'percentage'.",
                other
            )),
        }
    }
}

impl fmt::Display for DeltaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaMode::Absolute => write!(f, "absolute"),
            DeltaMode::Percentage => write!(f, "percentage"),
        }
    }
}

/// Direction of a computed delta, used for highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Zero,
}

/// A computed delta; serialized as a bare number
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeltaValue {
    Absolute(i64),
    Percentage(f64),
}

impl DeltaValue {
    pub fn sign(&self) -> Sign {
        match *self {
            DeltaValue::Absolute(v) if v > 0 => Sign::Positive,
            DeltaValue::Absolute(v) if v < 0 => Sign::Negative,
            DeltaValue::Percentage(v) if v > 0.0 => Sign::Positive,
            DeltaValue::Percentage(v) if v < 0.0 => Sign::Negative,
            _ => Sign::Zero,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            DeltaValue::Absolute(v) => v as f64,
            DeltaValue::Percentage(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_oi_is_put_minus_call() {
        let row = StrikeRow::new(24500, 1200, 50, 900, -20);
        assert_eq!(row.net_oi, -300);
        assert_eq!(StrikeRow::new(24500, 100, 0, 400, 0).net_oi, 300);
    }

    #[test]
    fn test_delta_mode_parse() {
        assert_eq!("Absolute".parse::<DeltaMode>().unwrap(), DeltaMode::Absolute);
        assert_eq!("pct".parse::<DeltaMode>().unwrap(), DeltaMode::Percentage);
        assert!("ratio".parse::<DeltaMode>().is_err());
    }

    #[test]
    fn test_delta_sign() {
        assert_eq!(DeltaValue::Absolute(-3).sign(), Sign::Negative);
        assert_eq!(DeltaValue::Absolute(0).sign(), Sign::Zero);
        assert_eq!(DeltaValue::Percentage(0.5).sign(), Sign::Positive);
        assert_eq!(DeltaValue::Percentage(0.0).sign(), Sign::Zero);
    }

    #[test]
    fn test_delta_serializes_as_number() {
        let json = serde_json::to_string(&vec![DeltaValue::Absolute(5), DeltaValue::Percentage(12.5)]).unwrap();
        assert_eq!(json, "[5,12.5]");
    }
}
