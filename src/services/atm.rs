//! ATM strike selection
//!
//! The write path always has the underlying price and picks the nearest
//! strike. The display path uses the same rule when a reference price was
//! stored with the snapshot, and otherwise falls back to the strike
//! carrying the most combined OI.

use crate::models::StrikeRow;
use serde::{Deserialize, Serialize};

/// Which rule produced an ATM strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtmPolicy {
    /// Minimal `|strike - reference|`, first occurrence wins ties
    NearestToUnderlying,
    /// Maximal `ce_oi + pe_oi`, first occurrence wins ties
    MaxCombinedOi,
}

/// A selected ATM strike and the policy that picked it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmSelection {
    pub strike: i64,
    pub policy: AtmPolicy,
}

/// Index of the value nearest `reference`; ties keep the earliest index
pub fn nearest_index<I>(values: I, reference: f64) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in values.into_iter().enumerate() {
        let distance = (value - reference).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Strike with the largest combined call + put OI; ties keep the earliest row
pub fn max_combined_oi(rows: &[StrikeRow]) -> Option<i64> {
    let mut best: Option<(i64, i64)> = None;
    for row in rows {
        let combined = row.ce_oi.saturating_add(row.pe_oi);
        match best {
            Some((_, best_combined)) if combined <= best_combined => {}
            _ => best = Some((row.strike, combined)),
        }
    }
    best.map(|(strike, _)| strike)
}

/// ATM for display: nearest to the stored reference price, else max combined OI
pub fn select_display_atm(rows: &[StrikeRow], reference: Option<f64>) -> Option<AtmSelection> {
    match reference.filter(|r| r.is_finite()) {
        Some(reference) => nearest_index(rows.iter().map(|r| r.strike as f64), reference).map(|idx| {
            AtmSelection {
                strike: rows[idx].strike,
                policy: AtmPolicy::NearestToUnderlying,
            }
        }),
        None => max_combined_oi(rows).map(|strike| AtmSelection {
            strike,
            policy: AtmPolicy::MaxCombinedOi,
        }),
    }
}
