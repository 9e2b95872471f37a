//! Persistence layer
//!
//! The core only needs an append-only row store with newest-first reads.
//! `SnapshotStore` is that contract; `sqlite::SqliteDb` implements it.

pub mod sqlite;

use crate::error::Result;
use crate::models::{CaptureInfo, OptionChainSnapshot, StoredRow};

/// Append-only snapshot store shared by the capture and display loops
pub trait SnapshotStore: Send + Sync {
    /// Record every row of one capture event, all-or-nothing. Returns rows written.
    fn append(&self, snapshot: &OptionChainSnapshot) -> Result<usize>;

    /// Most recent `limit` rows across all capture events, newest first
    fn latest_rows(&self, limit: usize) -> Result<Vec<StoredRow>>;

    /// Most recent `limit` rows of one expiry, newest first
    fn latest_rows_for_expiry(&self, expiry: &str, limit: usize) -> Result<Vec<StoredRow>>;

    /// Most recent distinct capture times, newest first
    fn distinct_capture_times(&self, limit: usize) -> Result<Vec<String>>;

    /// Most recent distinct capture times for one expiry, newest first
    fn distinct_capture_times_for_expiry(&self, expiry: &str, limit: usize) -> Result<Vec<String>>;

    /// All rows of one capture event, ascending by strike
    fn rows_at(&self, time: &str) -> Result<Vec<StoredRow>>;

    /// Metadata recorded with a capture event, if any
    fn capture_info(&self, time: &str) -> Result<Option<CaptureInfo>>;
}
