//! SQLite database module

pub mod models;
mod migrations;
mod oi_data;
mod settings;

use crate::db::SnapshotStore;
use crate::error::Result;
use crate::models::{CaptureInfo, OptionChainSnapshot, StoredRow};
pub use models::{DashboardSettings, SettingsUpdate};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Create new SQLite database connection
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode so the dashboard can read while the collector writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };

        // Run migrations
        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Settings Methods ==========

    /// Get dashboard settings
    pub fn get_settings(&self) -> Result<DashboardSettings> {
        let conn = self.conn.lock();
        settings::get_settings(&conn)
    }

    /// Update dashboard settings
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<DashboardSettings> {
        let conn = self.conn.lock();
        settings::update_settings(&conn, update)
    }
}

impl SnapshotStore for SqliteDb {
    fn append(&self, snapshot: &OptionChainSnapshot) -> Result<usize> {
        let mut conn = self.conn.lock();
        oi_data::append_snapshot(&mut conn, snapshot)
    }

    fn latest_rows(&self, limit: usize) -> Result<Vec<StoredRow>> {
        let conn = self.conn.lock();
        oi_data::latest_rows(&conn, None, limit)
    }

    fn latest_rows_for_expiry(&self, expiry: &str, limit: usize) -> Result<Vec<StoredRow>> {
        let conn = self.conn.lock();
        oi_data::latest_rows(&conn, Some(expiry), limit)
    }

    fn distinct_capture_times(&self, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        oi_data::distinct_capture_times(&conn, None, limit)
    }

    fn distinct_capture_times_for_expiry(&self, expiry: &str, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        oi_data::distinct_capture_times(&conn, Some(expiry), limit)
    }

    fn rows_at(&self, time: &str) -> Result<Vec<StoredRow>> {
        let conn = self.conn.lock();
        oi_data::rows_at(&conn, time)
    }

    fn capture_info(&self, time: &str) -> Result<Option<CaptureInfo>> {
        let conn = self.conn.lock();
        oi_data::capture_info(&conn, time)
    }
}
