//! Admin endpoints for catalog reloads, plus the root/health descriptors

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Query params for admin operations
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Admin key for authorization (simple protection)
    pub key: Option<String>,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub reloaded: usize,
}

/// Validate the admin key; admin routes are refused entirely when no key is
/// configured.
fn validate_admin_key(state: &AppState, provided_key: Option<&str>) -> bool {
    match (&state.config.admin_key, provided_key) {
        (Some(expected), Some(key)) => key == expected,
        _ => false,
    }
}

/// POST /admin/reload - reload every registered user's catalog sequentially
pub async fn reload_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !validate_admin_key(&state, query.key.as_deref()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid or missing admin key" })),
        ));
    }

    state.catalog.reload_all(&state.registry).await;
    let count = state.registry.len();
    tracing::info!("Admin: reloaded {} catalog(s)", count);

    Ok(Json(ReloadResponse {
        success: true,
        message: format!("Reloaded {count} catalog(s)"),
        reloaded: count,
    }))
}

/// POST /admin/reload/:username - reload one user's catalog
pub async fn reload_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !validate_admin_key(&state, query.key.as_deref()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid or missing admin key" })),
        ));
    }

    let Some(user) = state.registry.find(&username) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Unknown user" })),
        ));
    };

    let catalog = state.catalog.reload(user).await;
    tracing::info!(
        "Admin: reloaded catalog for '{}' ({} channels)",
        user.username,
        catalog.channels.len()
    );

    Ok(Json(ReloadResponse {
        success: true,
        message: format!(
            "Reloaded '{}': {} channels in {} categories",
            user.username,
            catalog.channels.len(),
            catalog.categories.len()
        ),
        reloaded: 1,
    }))
}

/// DELETE /admin/cache/:username - drop one user's cached catalog so the
/// next authenticated access loads it fresh
pub async fn invalidate_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !validate_admin_key(&state, query.key.as_deref()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid or missing admin key" })),
        ));
    }

    let Some(user) = state.registry.find(&username) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Unknown user" })),
        ));
    };

    state.catalog.invalidate(&user.username).await;
    tracing::info!("Admin: invalidated catalog for '{}'", user.username);

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Invalidated catalog for '{}'", user.username)
    })))
}

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "xtream-bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    uptime: u64,
    users: usize,
    cached_catalogs: usize,
    cached_guides: usize,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = HealthResponse {
        status: "ok".to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        users: state.registry.len(),
        cached_catalogs: state.catalog.len().await,
        cached_guides: state.epg.len().await,
    };
    Json(health)
}
