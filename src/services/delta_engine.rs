//! Delta Engine
//!
//! Pairs the latest stored snapshot with the one before it, strike by
//! strike, and computes signed call/put OI deltas. Pure: the same inputs
//! always produce the same report.

use crate::models::{DeltaMode, DeltaValue, Sign, StrikeRow};
use crate::services::atm::{select_display_atm, AtmSelection};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A stored capture event read back for display
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub time: String,
    pub expiry: String,
    /// Underlying value recorded at capture time, when known
    pub reference_price: Option<f64>,
    pub rows: Vec<StrikeRow>,
}

/// One current strike joined with its previous-snapshot counterpart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRow {
    pub current: StrikeRow,
    pub previous: StrikeRow,
    /// False when the strike is new and `previous` is the zero baseline
    pub matched: bool,
    pub ce_delta: DeltaValue,
    pub pe_delta: DeltaValue,
    pub ce_sign: Sign,
    pub pe_sign: Sign,
}

/// Deltas for a snapshot pair plus the display ATM
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaReport {
    pub mode: DeltaMode,
    pub atm: Option<AtmSelection>,
    pub rows: Vec<DeltaRow>,
}

impl DeltaReport {
    pub fn row_for(&self, strike: i64) -> Option<&DeltaRow> {
        self.rows.iter().find(|row| row.current.strike == strike)
    }
}

/// Change from `previous` to `current` in the requested mode.
///
/// Percentage mode yields exactly `0.0` when `previous` is zero.
pub fn delta(current: i64, previous: i64, mode: DeltaMode) -> DeltaValue {
    match mode {
        DeltaMode::Absolute => DeltaValue::Absolute(current.saturating_sub(previous)),
        DeltaMode::Percentage => {
            if previous == 0 {
                DeltaValue::Percentage(0.0)
            } else {
                DeltaValue::Percentage((current as f64 - previous as f64) / previous as f64 * 100.0)
            }
        }
    }
}

/// Left-join `current` onto `previous` by strike and compute deltas.
///
/// Every current strike appears exactly once, in input order. With no
/// previous snapshot every strike is compared against zero.
pub fn compute_deltas(
    current: &[StrikeRow],
    previous: Option<&[StrikeRow]>,
    mode: DeltaMode,
) -> Vec<DeltaRow> {
    let mut previous_by_strike: HashMap<i64, &StrikeRow> = HashMap::new();
    for row in previous.unwrap_or(&[]) {
        previous_by_strike.entry(row.strike).or_insert(row);
    }

    let mut emitted = HashSet::new();
    current
        .iter()
        .filter(|row| emitted.insert(row.strike))
        .map(|row| {
            let (previous, matched) = match previous_by_strike.get(&row.strike) {
                Some(prev) => (**prev, true),
                None => (StrikeRow::zero(row.strike), false),
            };
            let ce_delta = delta(row.ce_oi, previous.ce_oi, mode);
            let pe_delta = delta(row.pe_oi, previous.pe_oi, mode);

            DeltaRow {
                current: *row,
                previous,
                matched,
                ce_delta,
                pe_delta,
                ce_sign: ce_delta.sign(),
                pe_sign: pe_delta.sign(),
            }
        })
        .collect()
}

/// Full delta pass for a snapshot pair, including the display ATM
pub fn run(current: &StoredSnapshot, previous: Option<&StoredSnapshot>, mode: DeltaMode) -> DeltaReport {
    DeltaReport {
        mode,
        atm: select_display_atm(&current.rows, current.reference_price),
        rows: compute_deltas(&current.rows, previous.map(|p| p.rows.as_slice()), mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::atm::AtmPolicy;
    use crate::services::normalizer::normalize;
    use crate::services::snapshot_builder::build_snapshot;
    use chrono::NaiveDate;
    use serde_json::json;

    fn snapshot(time: &str, reference: Option<f64>, rows: Vec<StrikeRow>) -> StoredSnapshot {
        StoredSnapshot {
            time: time.to_string(),
            expiry: "30-Jan-2025".to_string(),
            reference_price: reference,
            rows,
        }
    }

    #[test]
    fn test_percentage_increase() {
        assert_eq!(delta(150, 100, DeltaMode::Percentage), DeltaValue::Percentage(50.0));
    }

    #[test]
    fn test_percentage_zero_previous() {
        assert_eq!(delta(150, 0, DeltaMode::Percentage), DeltaValue::Percentage(0.0));
        assert_eq!(delta(0, 0, DeltaMode::Percentage), DeltaValue::Percentage(0.0));
        assert_eq!(delta(i64::MAX, 0, DeltaMode::Percentage).sign(), Sign::Zero);
    }

    #[test]
    fn test_percentage_never_non_finite() {
        for current in [-5, 0, 1, 150, 1_000_000_000] {
            for previous in [-3, 0, 1, 7, 1_000_000] {
                let value = delta(current, previous, DeltaMode::Percentage).as_f64();
                assert!(value.is_finite(), "{} vs {}", current, previous);
            }
        }
    }

    #[test]
    fn test_absolute_is_exact_difference() {
        for (current, previous) in [(150, 100), (100, 150), (0, 0), (0, 9_000_000), (12, -4)] {
            assert_eq!(
                delta(current, previous, DeltaMode::Absolute),
                DeltaValue::Absolute(current - previous)
            );
        }
        assert_eq!(delta(100, 150, DeltaMode::Absolute).sign(), Sign::Negative);
    }

    fn captured(time: &str, ce_oi: f64, pe_oi: f64) -> StoredSnapshot {
        let payload = json!({
            "records": {
                "expiryDates": ["30-Jan-2025"],
                "underlyingValue": 200.0,
                "data": [{
                    "strikePrice": 200,
                    "expiryDate": "30-Jan-2025",
                    "CE": {"openInterest": ce_oi},
                    "PE": {"openInterest": pe_oi}
                }]
            }
        });
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let chain = normalize(Some(&payload), today).unwrap();
        let built = build_snapshot(&chain, 100, time).unwrap();
        snapshot(time, Some(built.underlying_value), built.rows)
    }

    #[test]
    fn test_extreme_payload_values_stay_ordered() {
        let first = captured("t1", -1.0, 1e19);
        let second = captured("t2", 1e19, -5.0);
        assert_eq!(first.rows[0].ce_oi, 0);
        assert_eq!(first.rows[0].pe_oi, i64::MAX);

        let report = run(&second, Some(&first), DeltaMode::Absolute);
        let row = &report.rows[0];
        assert_eq!(row.ce_delta, DeltaValue::Absolute(i64::MAX));
        assert_eq!(row.ce_sign, Sign::Positive);
        assert_eq!(row.pe_delta, DeltaValue::Absolute(-i64::MAX));
        assert_eq!(row.pe_sign, Sign::Negative);

        let report = run(&second, Some(&first), DeltaMode::Percentage);
        assert_eq!(report.rows[0].ce_delta, DeltaValue::Percentage(0.0));
        assert_eq!(report.rows[0].pe_delta, DeltaValue::Percentage(-100.0));

        let rows = [StrikeRow::new(100, i64::MAX, 0, i64::MAX, 0), StrikeRow::new(150, 1, 0, 1, 0)];
        assert_eq!(crate::services::atm::max_combined_oi(&rows), Some(100));
    }

    #[test]
    fn test_percentage_negative() {
        assert_eq!(delta(50, 200, DeltaMode::Percentage), DeltaValue::Percentage(-75.0));
        assert_eq!(delta(50, 200, DeltaMode::Percentage).sign(), Sign::Negative);
    }

    #[test]
    fn test_left_join_completeness() {
        let current = vec![
            StrikeRow::new(100, 10, 0, 20, 0),
            StrikeRow::new(150, 30, 0, 40, 0),
            StrikeRow::new(200, 50, 0, 60, 0),
        ];
        let previous = vec![StrikeRow::new(150, 20, 0, 50, 0), StrikeRow::new(250, 1, 0, 1, 0)];
        let rows = compute_deltas(&current, Some(&previous), DeltaMode::Absolute);

        let strikes: Vec<i64> = rows.iter().map(|r| r.current.strike).collect();
        assert_eq!(strikes, vec![100, 150, 200]);

        assert!(!rows[0].matched);
        assert_eq!(rows[0].ce_delta, DeltaValue::Absolute(10));
        assert!(rows[1].matched);
        assert_eq!(rows[1].ce_delta, DeltaValue::Absolute(10));
        assert_eq!(rows[1].pe_delta, DeltaValue::Absolute(-10));
        assert_eq!(rows[1].ce_sign, Sign::Positive);
        assert_eq!(rows[1].pe_sign, Sign::Negative);
    }

    #[test]
    fn test_duplicate_current_strike_emitted_once() {
        let current = vec![StrikeRow::new(100, 10, 0, 20, 0), StrikeRow::new(100, 99, 0, 99, 0)];
        let rows = compute_deltas(&current, None, DeltaMode::Absolute);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current.ce_oi, 10);
    }

    #[test]
    fn test_single_capture_zero_baseline() {
        let current = snapshot(
            "t1",
            Some(205.0),
            vec![StrikeRow::new(200, 150, 3, 80, -2), StrikeRow::new(250, 0, 0, 40, 1)],
        );

        let absolute = run(&current, None, DeltaMode::Absolute);
        for row in &absolute.rows {
            assert_eq!(row.ce_delta, DeltaValue::Absolute(row.current.ce_oi));
            assert_eq!(row.pe_delta, DeltaValue::Absolute(row.current.pe_oi));
        }

        let percentage = run(&current, None, DeltaMode::Percentage);
        for row in &percentage.rows {
            assert_eq!(row.ce_delta, DeltaValue::Percentage(0.0));
            assert_eq!(row.pe_delta, DeltaValue::Percentage(0.0));
            assert_eq!(row.ce_sign, Sign::Zero);
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let current = snapshot("t2", None, vec![StrikeRow::new(200, 150, 0, 80, 0)]);
        let previous = snapshot("t1", None, vec![StrikeRow::new(200, 100, 0, 100, 0)]);

        let first = run(&current, Some(&previous), DeltaMode::Percentage);
        let second = run(&current, Some(&previous), DeltaMode::Percentage);
        assert_eq!(first, second);
        assert_eq!(first.rows[0].ce_delta, DeltaValue::Percentage(50.0));
        assert_eq!(first.rows[0].pe_delta, DeltaValue::Percentage(-20.0));
    }

    #[test]
    fn test_run_selects_display_atm() {
        let rows = vec![StrikeRow::new(200, 1, 0, 1, 0), StrikeRow::new(250, 500, 0, 500, 0)];

        let with_reference = run(&snapshot("t", Some(210.0), rows.clone()), None, DeltaMode::Absolute);
        let atm = with_reference.atm.unwrap();
        assert_eq!(atm.strike, 200);
        assert_eq!(atm.policy, AtmPolicy::NearestToUnderlying);

        let without = run(&snapshot("t", None, rows), None, DeltaMode::Absolute);
        let atm = without.atm.unwrap();
        assert_eq!(atm.strike, 250);
        assert_eq!(atm.policy, AtmPolicy::MaxCombinedOi);
    }
}
