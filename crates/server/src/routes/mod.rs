//! HTTP route handlers.
//!
//! Every success response is wrapped in `{ "success": true, "data": ... }`
//! and every error in `{ "success": false, "message": ... }`, so clients
//! can branch on `success` without inspecting status codes.

pub mod auth;
pub mod orders;
pub mod promotions;
pub mod restaurants;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// Success envelope for all JSON responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap a payload in the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

/// Assemble the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(health_ready))
        .merge(auth::router())
        .merge(restaurants::router())
        .merge(orders::router())
        .merge(promotions::router())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness probe: verifies the database is reachable.
async fn health_ready(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>> {
    sqlx::query("SELECT 1")
        .execute(state.pool())
        .await
        .map_err(crate::db::RepositoryError::from)?;
    Ok(Json(serde_json::json!({ "status": "ready" })))
}
