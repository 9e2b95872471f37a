//! Dashboard API endpoint handlers

use crate::api::types::{ApiResponse, LimitQuery, ViewQuery};
use crate::db::sqlite::{DashboardSettings, SettingsUpdate};
use crate::error::{AppError, Result};
use crate::models::StoredRow;
use crate::scheduler;
use crate::services::view_model::{DashboardState, NetOiPoint};
use crate::services::{DashboardService, RECENT_ROWS_LIMIT};
use crate::state::AppState;
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

/// Run a synchronous store call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health or GET /
pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::<()>::success_with_message("OI monitor is running"))
}

// ============================================================================
// Open Interest
// ============================================================================

/// Dashboard view - GET /api/oi/view?mode=percentage&expiry=30-Jan-2025
///
/// Without parameters the view cached by the refresh loop is served,
/// computing and caching it first if the cache is empty.
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ApiResponse<DashboardState>>> {
    if query.is_default() {
        if let Some(view) = state.cached_view() {
            return Ok(Json(ApiResponse::success_with_data(view)));
        }
        scheduler::refresh_once(&state).await?;
        let view = state.cached_view().unwrap_or_else(DashboardState::no_data);
        return Ok(Json(ApiResponse::success_with_data(view)));
    }

    let sqlite = state.sqlite.clone();
    let view = blocking(move || {
        let settings = sqlite.get_settings()?;
        let mode = query.mode.unwrap_or(settings.delta_mode);
        let expiry = query.expiry.or(settings.expiry_filter);
        DashboardService::load_view(sqlite.as_ref(), mode, expiry.as_deref())
    })
    .await?;

    Ok(Json(ApiResponse::success_with_data(view)))
}

/// Recent rows, ascending by time - GET /api/oi/rows?limit=500&expiry=30-Jan-2025
///
/// Without `expiry` the stored expiry filter applies.
pub async fn get_rows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<StoredRow>>>> {
    let limit = resolve_limit(query.limit)?;
    let sqlite = state.sqlite.clone();
    let rows = blocking(move || {
        let expiry = query.expiry.or(sqlite.get_settings()?.expiry_filter);
        DashboardService::recent_rows(sqlite.as_ref(), limit, expiry.as_deref())
    })
    .await?;
    Ok(Json(ApiResponse::success_with_data(rows)))
}

/// Mean net OI per capture time - GET /api/oi/net-series?limit=500&expiry=30-Jan-2025
pub async fn get_net_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<NetOiPoint>>>> {
    let limit = resolve_limit(query.limit)?;
    let sqlite = state.sqlite.clone();
    let series = blocking(move || {
        let expiry = query.expiry.or(sqlite.get_settings()?.expiry_filter);
        DashboardService::net_oi_series(sqlite.as_ref(), limit, expiry.as_deref())
    })
    .await?;
    Ok(Json(ApiResponse::success_with_data(series)))
}

fn resolve_limit(limit: Option<usize>) -> Result<usize> {
    match limit {
        None => Ok(RECENT_ROWS_LIMIT),
        Some(0) => Err(AppError::Validation("limit must be at least 1".to_string())),
        Some(n) => Ok(n.min(RECENT_ROWS_LIMIT * 20)),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Current dashboard settings - GET /api/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardSettings>>> {
    let sqlite = state.sqlite.clone();
    let settings = blocking(move || sqlite.get_settings()).await?;
    Ok(Json(ApiResponse::success_with_data(settings)))
}

/// Update dashboard settings - POST /api/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ApiResponse<DashboardSettings>>> {
    let sqlite = state.sqlite.clone();
    let settings = blocking(move || sqlite.update_settings(&update)).await?;

    info!(
        "Settings updated: mode={} refresh={}s expiry={:?}",
        settings.delta_mode, settings.refresh_interval_secs, settings.expiry_filter
    );
    state.invalidate_view();

    Ok(Json(ApiResponse::success_with_data(settings)))
}
