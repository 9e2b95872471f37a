//! Settings management

use crate::config::validate_refresh_interval;
use crate::db::sqlite::models::{DashboardSettings, SettingsUpdate};
use crate::error::{AppError, Result};
use crate::models::DeltaMode;
use rusqlite::Connection;

/// Get settings
pub fn get_settings(conn: &Connection) -> Result<DashboardSettings> {
    let (delta_mode, refresh_interval_secs, expiry_filter, updated_at) = conn.query_row(
        "SELECT delta_mode, refresh_interval_secs, expiry_filter, updated_at
         FROM settings WHERE id = 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    )?;

    let delta_mode: DeltaMode = delta_mode
        .parse()
        .map_err(|e: String| AppError::Internal(format!("Stored delta mode is invalid: {}", e)))?;

    Ok(DashboardSettings {
        delta_mode,
        refresh_interval_secs: refresh_interval_secs.max(0) as u64,
        expiry_filter,
        updated_at,
    })
}

/// Update settings
pub fn update_settings(conn: &Connection, update: &SettingsUpdate) -> Result<DashboardSettings> {
    let mut updates = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(mode) = update.delta_mode {
        updates.push("delta_mode = ?");
        params.push(Box::new(mode.to_string()));
    }
    if let Some(secs) = update.refresh_interval_secs {
        validate_refresh_interval(secs).map_err(|e| AppError::Validation(e.to_string()))?;
        updates.push("refresh_interval_secs = ?");
        params.push(Box::new(secs as i64));
    }
    if let Some(ref expiry) = update.expiry_filter {
        let expiry = expiry.trim();
        updates.push("expiry_filter = ?");
        if expiry.is_empty() {
            params.push(Box::new(Option::<String>::None));
        } else {
            params.push(Box::new(expiry.to_string()));
        }
    }

    if !updates.is_empty() {
        updates.push("updated_at = datetime('now')");

        let sql = format!("UPDATE settings SET {} WHERE id = 1", updates.join(", "));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;
    }

    get_settings(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::migrations::run_migrations;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_default_settings() {
        let conn = create_test_db();
        let settings = get_settings(&conn).unwrap();
        assert_eq!(settings.delta_mode, DeltaMode::Absolute);
        assert_eq!(settings.refresh_interval_secs, 60);
        assert!(settings.expiry_filter.is_none());
    }

    #[test]
    fn test_partial_update() {
        let conn = create_test_db();
        let update = SettingsUpdate {
            delta_mode: Some(DeltaMode::Percentage),
            expiry_filter: Some(" 30-Jan-2025 ".to_string()),
            ..Default::default()
        };
        let settings = update_settings(&conn, &update).unwrap();
        assert_eq!(settings.delta_mode, DeltaMode::Percentage);
        assert_eq!(settings.refresh_interval_secs, 60);
        assert_eq!(settings.expiry_filter.as_deref(), Some("30-Jan-2025"));

        let cleared = update_settings(
            &conn,
            &SettingsUpdate {
                expiry_filter: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(cleared.expiry_filter.is_none());
        assert_eq!(cleared.delta_mode, DeltaMode::Percentage);
    }

    #[test]
    fn test_refresh_interval_out_of_range() {
        let conn = create_test_db();
        let result = update_settings(
            &conn,
            &SettingsUpdate {
                refresh_interval_secs: Some(5),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(get_settings(&conn).unwrap().refresh_interval_secs, 60);
    }
}
