//! Exchange-local clock helpers
//!
//! The exchange trades on India Standard Time, so "today" for expiry
//! selection and the capture timestamps are both taken in `Asia/Kolkata`.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Asia::Kolkata;
use parking_lot::Mutex;

/// Stored timestamp format; lexicographic order equals time order
pub const CAPTURE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Current calendar date in IST
pub fn today_ist() -> NaiveDate {
    Utc::now().with_timezone(&Kolkata).date_naive()
}

/// Current wall-clock time in IST without zone
pub fn now_ist() -> NaiveDateTime {
    Utc::now().with_timezone(&Kolkata).naive_local()
}

/// Hands out capture timestamps that strictly increase for the process lifetime
#[derive(Debug, Default)]
pub struct CaptureClock {
    last: Mutex<Option<NaiveDateTime>>,
}

impl CaptureClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next capture timestamp, formatted for storage
    pub fn next(&self) -> String {
        self.next_at(now_ist())
    }

    /// Next timestamp given the observed wall-clock time; bumps by 1 ms on collision or clock step-back
    pub fn next_at(&self, now: NaiveDateTime) -> String {
        let mut last = self.last.lock();
        // Millisecond precision is all the stored format keeps
        let now = truncate_to_millis(now);
        let ts = match *last {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(ts);
        ts.format(CAPTURE_TIME_FORMAT).to_string()
    }
}

fn truncate_to_millis(ts: NaiveDateTime) -> NaiveDateTime {
    let nanos = (ts.nanosecond() / 1_000_000) * 1_000_000;
    ts.with_nanosecond(nanos).unwrap_or(ts)
}
