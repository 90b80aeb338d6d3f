use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::counts::CreateInventoryCount;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListCountsQuery {
    #[serde(default)]
    pub pending_only: bool,
}

pub fn counts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_counts).post(create_count))
        .route("/:id", get(get_count))
        .route("/:id/approve", post(approve_count))
}

async fn list_counts(
    State(state): State<AppState>,
    Query(query): Query<ListCountsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let counts = state.count_service.list(query.pending_only).await?;
    Ok(Json(counts))
}

async fn get_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let count = state.count_service.get(id).await?;
    Ok(Json(count))
}

async fn create_count(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryCount>,
) -> Result<impl IntoResponse, ServiceError> {
    let count = state.count_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(count)))
}

/// Approve a pending count, applying the correction to the ledger.
/// A second approval attempt returns 409.
pub async fn approve_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let adjustment = state.count_service.approve(id).await?;
    Ok(Json(json!({ "ok": true, "adjustment": adjustment })))
}
