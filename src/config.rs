//! Runtime configuration
//!
//! Every option can be given as a command-line flag or an `OI_*` environment
//! variable. Values are validated once at startup.

use crate::error::{AppError, Result};
use crate::models::DeltaMode;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default capture interval (5 minutes)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Default half-width of the strike window around ATM, in index points
pub const DEFAULT_ATM_RANGE: i64 = 300;

/// Default dashboard refresh interval
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Operator-adjustable refresh bounds
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 10;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 300;

/// Where raw option-chain payloads come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Exchange JSON API over HTTPS
    Nse,
    /// Replay a saved payload from disk (one file, re-read every cycle)
    File(PathBuf),
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("nse") {
            return Ok(SourceKind::Nse);
        }
        match s.strip_prefix("file:") {
            Some(path) if !path.is_empty() => Ok(SourceKind::File(PathBuf::from(path))),
            _ => Err(format!("Invalid source '{}'. Use 'nse' or 'file:<path>'.", s)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Nse => write!(f, "nse"),
            SourceKind::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Option-chain OI collector and delta dashboard.
#[derive(Parser, Debug, Clone)]
#[command(name = "oi-monitor", version, about)]
pub struct AppConfig {
    /// Underlying symbol to track
    #[arg(long, env = "OI_SYMBOL", default_value = "NIFTY")]
    pub symbol: String,

    /// Seconds between option-chain captures
    #[arg(long = "poll-interval", env = "OI_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Keep strikes within this many points of the ATM strike
    #[arg(long, env = "OI_ATM_RANGE", default_value_t = DEFAULT_ATM_RANGE)]
    pub atm_range: i64,

    /// Delta display mode: absolute or percentage
    #[arg(long, env = "OI_DELTA_MODE", default_value = "absolute")]
    pub delta_mode: DeltaMode,

    /// Seconds between dashboard view recomputations (10-300)
    #[arg(long = "refresh-interval", env = "OI_REFRESH_INTERVAL", default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    pub refresh_interval_secs: u64,

    /// SQLite database file
    #[arg(long, env = "OI_DB_PATH", default_value = "oi_live.db")]
    pub db_path: PathBuf,

    /// Dashboard API bind host
    #[arg(long, env = "OI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Dashboard API bind port
    #[arg(long, env = "OI_PORT", default_value_t = 8501)]
    pub port: u16,

    /// Payload source: `nse` or `file:<path>`
    #[arg(long, env = "OI_SOURCE", default_value = "nse")]
    pub source: SourceKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: "NIFTY".to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            atm_range: DEFAULT_ATM_RANGE,
            delta_mode: DeltaMode::Absolute,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            db_path: PathBuf::from("oi_live.db"),
            host: "127.0.0.1".to_string(),
            port: 8501,
            source: SourceKind::Nse,
        }
    }
}

impl AppConfig {
    /// Reject values the loops cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(AppError::Config("symbol must not be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config("poll interval must be at least 1 second".to_string()));
        }
        if self.atm_range < 0 {
            return Err(AppError::Config(format!(
                "ATM range must be non-negative, got {}",
                self.atm_range
            )));
        }
        validate_refresh_interval(self.refresh_interval_secs)?;
        Ok(())
    }
}

/// Refresh interval must stay within the operator slider bounds
pub fn validate_refresh_interval(secs: u64) -> Result<()> {
    if !(MIN_REFRESH_INTERVAL_SECS..=MAX_REFRESH_INTERVAL_SECS).contains(&secs) {
        return Err(AppError::Config(format!(
            "refresh interval must be between {} and {} seconds, got {}",
            MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS, secs
        )));
    }
    Ok(())
}
