//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_oi_data", CREATE_OI_DATA_TABLE)?;
    run_migration(conn, "002_oi_captures", CREATE_OI_CAPTURES_TABLE)?;
    run_migration(conn, "003_settings", CREATE_SETTINGS_TABLE)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

// Column set must match databases written by earlier collectors
const CREATE_OI_DATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS oi_data (
    time TEXT,
    expiry TEXT,
    strike INTEGER,
    ce_oi INTEGER,
    ce_oi_change INTEGER,
    pe_oi INTEGER,
    pe_oi_change INTEGER,
    net_oi INTEGER
);
CREATE INDEX IF NOT EXISTS idx_oi_data_time ON oi_data(time DESC);
CREATE INDEX IF NOT EXISTS idx_oi_data_expiry_time ON oi_data(expiry, time DESC);
"#;

const CREATE_OI_CAPTURES_TABLE: &str = r#"
CREATE TABLE oi_captures (
    time TEXT PRIMARY KEY,
    expiry TEXT NOT NULL,
    underlying_value REAL NOT NULL,
    atm_strike INTEGER NOT NULL,
    row_count INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    delta_mode TEXT NOT NULL DEFAULT 'absolute',
    refresh_interval_secs INTEGER NOT NULL DEFAULT 60,
    expiry_filter TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
INSERT OR IGNORE INTO settings (id) VALUES (1);
"#;
