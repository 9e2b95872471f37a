//! Application state management

use crate::clock::CaptureClock;
use crate::config::AppConfig;
use crate::db::sqlite::{SettingsUpdate, SqliteDb};
use crate::db::SnapshotStore;
use crate::error::Result;
use crate::services::view_model::DashboardState;
use parking_lot::RwLock;
use std::sync::Arc;

/// Application state shared by the loops and the HTTP handlers
pub struct AppState {
    /// SQLite database connection
    pub sqlite: Arc<SqliteDb>,

    /// Startup configuration
    pub config: AppConfig,

    /// Capture timestamp source
    pub clock: CaptureClock,

    /// Last view computed by the refresh loop
    view: RwLock<Option<DashboardState>>,
}

impl AppState {
    /// Open the database and seed dashboard settings from configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Database: {:?}", config.db_path);
        let sqlite = Arc::new(SqliteDb::new(&config.db_path)?);
        Self::with_db(config, sqlite)
    }

    /// Build state over an already opened database
    pub fn with_db(config: AppConfig, sqlite: Arc<SqliteDb>) -> Result<Self> {
        sqlite.update_settings(&SettingsUpdate {
            delta_mode: Some(config.delta_mode),
            refresh_interval_secs: Some(config.refresh_interval_secs),
            expiry_filter: None,
        })?;

        Ok(Self {
            sqlite,
            config,
            clock: CaptureClock::new(),
            view: RwLock::new(None),
        })
    }

    /// Store handle for blocking tasks
    pub fn store(&self) -> Arc<dyn SnapshotStore> {
        self.sqlite.clone()
    }

    /// Get the cached dashboard view
    pub fn cached_view(&self) -> Option<DashboardState> {
        self.view.read().clone()
    }

    /// Replace the cached dashboard view
    pub fn set_cached_view(&self, view: DashboardState) {
        *self.view.write() = Some(view);
    }

    /// Drop the cached view so the next read recomputes it
    pub fn invalidate_view(&self) {
        *self.view.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeltaMode;

    #[test]
    fn test_settings_seeded_from_config() {
        let config = AppConfig {
            delta_mode: DeltaMode::Percentage,
            refresh_interval_secs: 30,
            ..AppConfig::default()
        };
        let state = AppState::with_db(config, Arc::new(SqliteDb::open_in_memory().unwrap())).unwrap();

        let settings = state.sqlite.get_settings().unwrap();
        assert_eq!(settings.delta_mode, DeltaMode::Percentage);
        assert_eq!(settings.refresh_interval_secs, 30);
        assert!(state.cached_view().is_none());

        state.set_cached_view(DashboardState::no_data());
        assert_eq!(state.cached_view(), Some(DashboardState::no_data()));
        state.invalidate_view();
        assert!(state.cached_view().is_none());
    }
}
