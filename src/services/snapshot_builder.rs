//! Snapshot Builder
//!
//! Filters the chain to the selected expiry, locates the ATM strike nearest
//! the underlying and keeps a window of strikes around it as flat rows.
//! Building never touches the store; the caller appends the result.

use crate::models::{OptionChainSnapshot, StrikeRow};
use crate::services::atm::nearest_index;
use crate::services::normalizer::{ChainItem, NormalizedChain, OptionSide};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Build the ATM-windowed snapshot; `None` when nothing matches the expiry
pub fn build_snapshot(
    chain: &NormalizedChain,
    atm_range: i64,
    captured_at: &str,
) -> Option<OptionChainSnapshot> {
    let underlying = chain.underlying_value;
    if !underlying.is_finite() {
        warn!("Underlying value {} is not a number, skipping snapshot", underlying);
        return None;
    }

    let items: Vec<(f64, &ChainItem)> = chain
        .records
        .data
        .iter()
        .filter(|item| item.expiry_token().as_deref() == Some(chain.expiry.trim()))
        .filter_map(|item| {
            item.strike_price
                .filter(|s| s.is_finite())
                .map(|strike| (strike, item))
        })
        .collect();

    if items.is_empty() {
        debug!("No chain items for expiry {}", chain.expiry);
        return None;
    }

    let atm_idx = nearest_index(items.iter().map(|(strike, _)| *strike), underlying)?;
    let atm = items[atm_idx].0;
    let window = atm_range as f64;

    let mut seen = HashSet::new();
    let mut rows: Vec<StrikeRow> = Vec::new();
    for (strike, item) in &items {
        if (strike - atm).abs() > window {
            continue;
        }
        let strike = strike.round() as i64;
        if !seen.insert(strike) {
            warn!("Duplicate strike {} for expiry {}, keeping first", strike, chain.expiry);
            continue;
        }
        rows.push(flatten_item(strike, item));
    }
    rows.sort_by_key(|row| row.strike);

    Some(OptionChainSnapshot {
        captured_at: captured_at.to_string(),
        expiry: chain.expiry.clone(),
        underlying_value: underlying,
        atm_strike: atm.round() as i64,
        rows,
    })
}

fn flatten_item(strike: i64, item: &ChainItem) -> StrikeRow {
    let empty = OptionSide::default();
    let call = item.call.as_ref().unwrap_or(&empty);
    let put = item.put.as_ref().unwrap_or(&empty);

    StrikeRow::new(strike, call.oi(), call.oi_change(), put.oi(), put.oi_change())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::normalize;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    const EXPIRY: &str = "30-Jan-2025";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
    }

    fn item(strike: f64, ce_oi: i64, pe_oi: i64) -> Value {
        json!({
            "strikePrice": strike,
            "expiryDate": EXPIRY,
            "CE": {"openInterest": ce_oi, "changeinOpenInterest": 5},
            "PE": {"openInterest": pe_oi, "changeinOpenInterest": -5}
        })
    }

    fn chain(underlying: f64, data: Vec<Value>) -> NormalizedChain {
        let payload = json!({
            "records": {
                "expiryDates": [EXPIRY, "06-Feb-2025"],
                "underlyingValue": underlying,
                "data": data
            }
        });
        normalize(Some(&payload), today()).unwrap()
    }

    #[test]
    fn test_window_around_nearest_strike() {
        let chain = chain(205.0, vec![item(100.0, 1, 1), item(200.0, 2, 2), item(300.0, 3, 3)]);
        let snapshot = build_snapshot(&chain, 50, "t0").unwrap();

        assert_eq!(snapshot.atm_strike, 200);
        let strikes: Vec<i64> = snapshot.rows.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![200]);
    }

    #[test]
    fn test_window_boundary_inclusive() {
        let chain = chain(205.0, vec![item(100.0, 1, 1), item(200.0, 2, 2), item(300.0, 3, 3)]);
        let snapshot = build_snapshot(&chain, 100, "t0").unwrap();
        assert_eq!(snapshot.rows.len(), 3);
    }

    #[test]
    fn test_rows_within_window_and_sorted() {
        let data: Vec<Value> = (0..60)
            .rev()
            .map(|i| item(22000.0 + i as f64 * 50.0, i, 2 * i))
            .collect();
        let chain = chain(23333.0, data);
        let snapshot = build_snapshot(&chain, 300, "t0").unwrap();

        assert_eq!(snapshot.atm_strike, 23350);
        assert_eq!(snapshot.rows.len(), 13);
        for row in &snapshot.rows {
            assert!((row.strike - snapshot.atm_strike).abs() <= 300);
        }
        assert!(snapshot.rows.windows(2).all(|w| w[0].strike < w[1].strike));
    }

    #[test]
    fn test_other_expiry_excluded() {
        let mut other = item(200.0, 99, 99);
        other["expiryDate"] = json!("06-Feb-2025");
        let chain = chain(200.0, vec![other, item(250.0, 1, 4)]);
        let snapshot = build_snapshot(&chain, 1000, "t0").unwrap();

        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].strike, 250);
        assert_eq!(snapshot.expiry, EXPIRY);
    }

    #[test]
    fn test_no_matching_items_is_empty() {
        let mut other = item(200.0, 1, 1);
        other["expiryDate"] = json!("06-Feb-2025");
        let chain = chain(200.0, vec![other]);
        assert!(build_snapshot(&chain, 300, "t0").is_none());
    }

    #[test]
    fn test_blank_expiry_date_item_excluded() {
        let mut blank = item(200.0, 99, 99);
        blank["expiryDate"] = json!(" ");
        blank["expiryDates"] = json!(EXPIRY);
        let chain = chain(200.0, vec![blank, item(250.0, 1, 4)]);
        let snapshot = build_snapshot(&chain, 1000, "t0").unwrap();

        let strikes: Vec<i64> = snapshot.rows.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![250]);
    }

    #[test]
    fn test_missing_side_is_zero_and_net_oi() {
        let data = vec![
            json!({"strikePrice": 200, "expiryDates": EXPIRY, "PE": {"openInterest": 700}}),
            json!({"strikePrice": 250, "expiryDates": EXPIRY, "CE": {"openInterest": 300}, "PE": null}),
        ];
        let chain = chain(210.0, data);
        let snapshot = build_snapshot(&chain, 100, "t0").unwrap();

        assert_eq!(snapshot.rows[0], StrikeRow::new(200, 0, 0, 700, 0));
        assert_eq!(snapshot.rows[0].net_oi, 700);
        assert_eq!(snapshot.rows[1].net_oi, -300);
    }

    #[test]
    fn test_atm_tie_first_occurrence() {
        let chain = chain(150.0, vec![item(200.0, 1, 1), item(100.0, 1, 1)]);
        let snapshot = build_snapshot(&chain, 0, "t0").unwrap();
        assert_eq!(snapshot.atm_strike, 200);
        assert_eq!(snapshot.rows.len(), 1);
    }

    #[test]
    fn test_duplicate_strike_keeps_first() {
        let chain = chain(200.0, vec![item(200.0, 10, 10), item(200.0, 99, 99)]);
        let snapshot = build_snapshot(&chain, 100, "t0").unwrap();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].ce_oi, 10);
    }
}
