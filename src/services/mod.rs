//! Services Layer
//!
//! Capture and display logic shared by the background loops and the
//! HTTP handlers.
//!
//! # Architecture
//!
//! ```text
//! PayloadSource --> normalizer --> snapshot_builder --> SnapshotStore   (CollectorService)
//! SnapshotStore --> delta_engine --> view_model --> HTTP / refresh loop (DashboardService)
//! ```
//!
//! # Services
//!
//! - `CollectorService` - One capture cycle
//! - `DashboardService` - Dashboard view, recent rows, net-OI series

pub mod atm;
pub mod collector_service;
pub mod dashboard_service;
pub mod delta_engine;
pub mod normalizer;
pub mod snapshot_builder;
pub mod view_model;

pub use collector_service::{CollectorService, CycleOutcome};
pub use dashboard_service::{DashboardService, RECENT_ROWS_LIMIT};
