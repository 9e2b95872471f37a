//! Payload Normalizer
//!
//! Validates the shape of a raw option-chain document, picks the nearest
//! live expiry and reads the underlying reference price.

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Exchange expiry token format, e.g. `30-Jan-2025`
pub const EXPIRY_FORMAT: &str = "%d-%b-%Y";

/// Per-item expiry field names seen upstream, tried in this order
pub const ITEM_EXPIRY_FIELDS: &[&str] = &["expiryDate", "expiryDates"];

/// The `records` container of an option-chain payload
#[derive(Debug, Clone, Deserialize)]
pub struct Records {
    #[serde(rename = "expiryDates", default)]
    pub expiry_dates: Vec<String>,

    #[serde(rename = "underlyingValue")]
    pub underlying_value: f64,

    #[serde(default)]
    pub data: Vec<ChainItem>,
}

/// One strike/expiry entry of the chain
#[derive(Debug, Clone, Deserialize)]
pub struct ChainItem {
    #[serde(rename = "strikePrice")]
    pub strike_price: Option<f64>,

    #[serde(rename = "CE")]
    pub call: Option<OptionSide>,

    #[serde(rename = "PE")]
    pub put: Option<OptionSide>,

    /// Remaining keys, consulted for the expiry token
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChainItem {
    /// Expiry token of this item, from the first known field name that carries one
    pub fn expiry_token(&self) -> Option<String> {
        // A present non-empty value wins even if it is only whitespace
        ITEM_EXPIRY_FIELDS.iter().find_map(|field| match self.extra.get(*field)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
    }
}

/// Call or put leg of a strike
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionSide {
    #[serde(rename = "openInterest", default)]
    pub open_interest: Option<f64>,

    #[serde(rename = "changeinOpenInterest", default)]
    pub change_in_open_interest: Option<f64>,
}

impl OptionSide {
    /// Open interest, never negative
    pub fn oi(&self) -> i64 {
        self.open_interest.map(to_count).unwrap_or(0).max(0)
    }

    /// Signed change reported upstream
    pub fn oi_change(&self) -> i64 {
        self.change_in_open_interest.map(to_count).unwrap_or(0)
    }
}

// `as` saturates out-of-range floats at the i64 bounds
fn to_count(v: f64) -> i64 {
    if v.is_finite() {
        v as i64
    } else {
        0
    }
}

/// Records with the expiry and reference price resolved
#[derive(Debug, Clone)]
pub struct NormalizedChain {
    pub records: Records,
    pub expiry: String,
    pub underlying_value: f64,
}

/// Normalize one captured payload; `None` is a capture failure
pub fn normalize(payload: Option<&Value>, today: NaiveDate) -> Result<NormalizedChain> {
    let payload = payload.ok_or_else(|| AppError::Capture("no payload this cycle".to_string()))?;
    let records = extract_records(payload)?;
    let expiry = select_expiry(&records.expiry_dates, today)?;
    let underlying_value = records.underlying_value;

    debug!(
        "Normalized payload: expiry={} underlying={} items={}",
        expiry,
        underlying_value,
        records.data.len()
    );

    Ok(NormalizedChain {
        records,
        expiry,
        underlying_value,
    })
}

/// Pull the typed `records` container out of a payload
pub fn extract_records(payload: &Value) -> Result<Records> {
    let records = payload
        .get("records")
        .filter(|v| v.is_object())
        .ok_or(AppError::MissingRecords)?;
    Ok(Records::deserialize(records)?)
}

/// Parse an exchange expiry token; `None` when it is not a date
pub fn parse_expiry(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token.trim(), EXPIRY_FORMAT).ok()
}

/// Earliest listed expiry on or after `today`
pub fn select_expiry(tokens: &[String], today: NaiveDate) -> Result<String> {
    let mut live: Vec<(NaiveDate, &str)> = tokens
        .iter()
        .filter_map(|token| parse_expiry(token).map(|date| (date, token.trim())))
        .filter(|(date, _)| *date >= today)
        .collect();

    live.sort();
    live.first()
        .map(|(_, token)| token.to_string())
        .ok_or(AppError::NoValidExpiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_past_expiry_skipped() {
        let expiries = tokens(&["01-Jan-2099", "15-Dec-2001"]);
        let selected = select_expiry(&expiries, date(2025, 6, 1)).unwrap();
        assert_eq!(selected, "01-Jan-2099");
    }

    #[test]
    fn test_earliest_live_expiry_wins() {
        let expiries = tokens(&["27-Feb-2025", "06-Feb-2025", "30-Jan-2025", "23-Jan-2025"]);
        let selected = select_expiry(&expiries, date(2025, 1, 24)).unwrap();
        assert_eq!(selected, "30-Jan-2025");
    }

    #[test]
    fn test_expiry_today_is_live() {
        let expiries = tokens(&["30-Jan-2025", "06-Feb-2025"]);
        let selected = select_expiry(&expiries, date(2025, 1, 30)).unwrap();
        assert_eq!(selected, "30-Jan-2025");
    }

    #[test]
    fn test_unparseable_tokens_discarded() {
        let expiries = tokens(&["soon", "2025-02-06", "", "06-Feb-2025"]);
        let selected = select_expiry(&expiries, date(2025, 1, 1)).unwrap();
        assert_eq!(selected, "06-Feb-2025");
    }

    #[test]
    fn test_no_live_expiry() {
        let expiries = tokens(&["15-Dec-2001", "garbage"]);
        let err = select_expiry(&expiries, date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::NoValidExpiry));

        let err = select_expiry(&[], date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::NoValidExpiry));
    }

    #[test]
    fn test_missing_records() {
        let err = normalize(Some(&json!({"filtered": {}})), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::MissingRecords));

        let err = normalize(Some(&json!({"records": []})), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::MissingRecords));
    }

    #[test]
    fn test_no_payload_is_capture_failure() {
        let err = normalize(None, date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::Capture(_)));
        assert!(err.is_cycle_skip());
    }

    #[test]
    fn test_normalize_reads_underlying() {
        let payload = json!({
            "records": {
                "expiryDates": ["30-Jan-2025"],
                "underlyingValue": 23456.75,
                "data": []
            }
        });
        let chain = normalize(Some(&payload), date(2025, 1, 2)).unwrap();
        assert_eq!(chain.expiry, "30-Jan-2025");
        assert_eq!(chain.underlying_value, 23456.75);
    }

    #[test]
    fn test_expiry_field_variants_in_order() {
        let item: ChainItem = serde_json::from_value(json!({
            "strikePrice": 100,
            "expiryDate": "30-Jan-2025",
            "expiryDates": "06-Feb-2025"
        }))
        .unwrap();
        assert_eq!(item.expiry_token().as_deref(), Some("30-Jan-2025"));

        let item: ChainItem = serde_json::from_value(json!({
            "strikePrice": 100,
            "expiryDate": "",
            "expiryDates": " 06-Feb-2025 "
        }))
        .unwrap();
        assert_eq!(item.expiry_token().as_deref(), Some("06-Feb-2025"));

        let item: ChainItem = serde_json::from_value(json!({"strikePrice": 100})).unwrap();
        assert_eq!(item.expiry_token(), None);
    }

    #[test]
    fn test_whitespace_expiry_does_not_fall_through() {
        let item: ChainItem = serde_json::from_value(json!({
            "strikePrice": 100,
            "expiryDate": " ",
            "expiryDates": "30-Jan-2025"
        }))
        .unwrap();
        assert_eq!(item.expiry_token().as_deref(), Some(""));
    }

    #[test]
    fn test_missing_side_values_default_to_zero() {
        let side: OptionSide = serde_json::from_value(json!({"openInterest": 1520.0})).unwrap();
        assert_eq!(side.oi(), 1520);
        assert_eq!(side.oi_change(), 0);
        assert_eq!(OptionSide::default().oi(), 0);
    }

    #[test]
    fn test_open_interest_clamped() {
        let side: OptionSide = serde_json::from_value(json!({
            "openInterest": -1,
            "changeinOpenInterest": -250
        }))
        .unwrap();
        assert_eq!(side.oi(), 0);
        assert_eq!(side.oi_change(), -250);

        let side: OptionSide = serde_json::from_value(json!({"openInterest": 1e19})).unwrap();
        assert_eq!(side.oi(), i64::MAX);
    }
}
