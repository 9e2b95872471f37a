//! SQLite database models

use crate::models::DeltaMode;
use serde::{Deserialize, Serialize};

/// Dashboard settings (single row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub delta_mode: DeltaMode,
    pub refresh_interval_secs: u64,
    /// Restrict the view to one expiry; `None` follows the latest capture
    pub expiry_filter: Option<String>,
    pub updated_at: String,
}

/// Partial update of dashboard settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub delta_mode: Option<DeltaMode>,
    pub refresh_interval_secs: Option<u64>,
    /// An empty string clears the filter
    pub expiry_filter: Option<String>,
}
