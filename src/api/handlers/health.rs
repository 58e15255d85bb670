use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::responses::{ApiResponse, HealthResponse};
use crate::state::AppState;
use std::sync::Arc;
use tracing::error;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse { status: "healthy", database: "up" }, "OK")),
        ),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::success(HealthResponse { status: "degraded", database: "down" }, "Database unreachable")),
            )
        }
    }
}
