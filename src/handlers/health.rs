use crate::{errors::ServiceError, AppState};
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    responses((status = 200, description = "Process is up", body = HealthResponse)),
    tag = "Health"
)]
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness probe: checks database connectivity
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Health"
)]
pub async fn ready(State(state): State<AppState>) -> Result<Json<HealthResponse>, ServiceError> {
    crate::db::ping(&state.db).await?;
    Ok(Json(HealthResponse { status: "ready" }))
}
