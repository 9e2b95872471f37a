//! Scheduler module
//!
//! Background loops:
//! - Option-chain capture every poll interval
//! - Dashboard view refresh every refresh interval

mod capture;
mod refresh;

pub use capture::CaptureScheduler;
pub use refresh::{compute_view, refresh_once, RefreshScheduler};
