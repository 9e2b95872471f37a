//! Open-interest rows and capture metadata
//!
//! `oi_data` holds one row per strike per capture event. `oi_captures`
//! holds one row per capture event and keys it by time, so a second
//! append at the same time fails and rolls back.

use crate::error::{AppError, Result};
use crate::models::{CaptureInfo, OptionChainSnapshot, StoredRow};
use rusqlite::{params, Connection, Row};

const ROW_COLUMNS: &str =
    "time, expiry, strike, ce_oi, ce_oi_change, pe_oi, pe_oi_change, net_oi";

/// Append every row of a snapshot in one transaction
pub fn append_snapshot(conn: &mut Connection, snapshot: &OptionChainSnapshot) -> Result<usize> {
    if snapshot.rows.is_empty() {
        return Err(AppError::StoreWrite(format!(
            "snapshot at {} has no rows",
            snapshot.captured_at
        )));
    }

    write_snapshot(conn, snapshot).map_err(|e| AppError::StoreWrite(e.to_string()))
}

fn write_snapshot(conn: &mut Connection, snapshot: &OptionChainSnapshot) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO oi_captures (time, expiry, underlying_value, atm_strike, row_count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            snapshot.captured_at,
            snapshot.expiry,
            snapshot.underlying_value,
            snapshot.atm_strike,
            snapshot.rows.len() as i64,
        ],
    )?;

    let mut written = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO oi_data ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            ROW_COLUMNS
        ))?;
        for row in &snapshot.rows {
            written += stmt.execute(params![
                snapshot.captured_at,
                snapshot.expiry,
                row.strike,
                row.ce_oi,
                row.ce_oi_change,
                row.pe_oi,
                row.pe_oi_change,
                row.net_oi,
            ])?;
        }
    }

    tx.commit()?;
    tracing::debug!(
        "Stored {} rows for capture {} (expiry {})",
        written,
        snapshot.captured_at,
        snapshot.expiry
    );
    Ok(written)
}

/// Most recent rows, newest first, optionally for one expiry
pub fn latest_rows(conn: &Connection, expiry: Option<&str>, limit: usize) -> Result<Vec<StoredRow>> {
    let rows = match expiry {
        Some(expiry) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM oi_data WHERE expiry = ?1 ORDER BY time DESC, strike ASC LIMIT ?2",
                ROW_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![expiry, limit as i64], map_stored_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM oi_data ORDER BY time DESC, strike ASC LIMIT ?1",
                ROW_COLUMNS
            ))?;
            let rows = stmt
                .query_map([limit as i64], map_stored_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(rows)
}

/// Distinct capture times, newest first, optionally for one expiry
pub fn distinct_capture_times(
    conn: &Connection,
    expiry: Option<&str>,
    limit: usize,
) -> Result<Vec<String>> {
    let times = match expiry {
        Some(expiry) => {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT time FROM oi_data WHERE expiry = ?1 ORDER BY time DESC LIMIT ?2",
            )?;
            let times = stmt
                .query_map(params![expiry, limit as i64], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            times
        }
        None => {
            let mut stmt =
                conn.prepare("SELECT DISTINCT time FROM oi_data ORDER BY time DESC LIMIT ?1")?;
            let times = stmt
                .query_map([limit as i64], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            times
        }
    };

    Ok(times)
}

/// All rows of one capture event, ascending by strike
pub fn rows_at(conn: &Connection, time: &str) -> Result<Vec<StoredRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM oi_data WHERE time = ?1 ORDER BY strike ASC",
        ROW_COLUMNS
    ))?;

    let rows = stmt
        .query_map([time], map_stored_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Capture metadata, absent for rows written before `oi_captures` existed
pub fn capture_info(conn: &Connection, time: &str) -> Result<Option<CaptureInfo>> {
    let result = conn.query_row(
        "SELECT time, expiry, underlying_value, atm_strike, row_count
         FROM oi_captures WHERE time = ?1",
        [time],
        |row| {
            Ok(CaptureInfo {
                time: row.get(0)?,
                expiry: row.get(1)?,
                underlying_value: row.get(2)?,
                atm_strike: row.get(3)?,
                row_count: row.get(4)?,
            })
        },
    );

    match result {
        Ok(info) => Ok(Some(info)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// Legacy tables have no NOT NULL constraints
fn map_stored_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        time: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        expiry: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        strike: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        ce_oi: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
        ce_oi_change: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
        pe_oi: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
        pe_oi_change: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
        net_oi: row.get::<_, Option<i64>>(7)?.unwrap_or_default(),
    })
}
