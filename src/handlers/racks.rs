//! Rack group / level / slot endpoints. Thin over `LocationService`;
//! level and slot names default to their templated display names there.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::locations::{
    CreateRackGroup, CreateRackLevel, CreateRackSlot, UpdateRackGroup, UpdateRackLevel,
    UpdateRackSlot,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RackGroupsQuery {
    pub warehouse_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RackLevelsQuery {
    pub rack_group_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RackSlotsQuery {
    pub rack_level_id: Option<Uuid>,
}

pub fn rack_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rack_groups).post(create_rack_group))
        .route(
            "/:id",
            get(get_rack_group)
                .put(update_rack_group)
                .delete(delete_rack_group),
        )
}

pub fn rack_levels_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rack_levels).post(create_rack_level))
        .route("/:id", put(update_rack_level).delete(delete_rack_level))
}

pub fn rack_slots_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rack_slots).post(create_rack_slot))
        .route("/:id", put(update_rack_slot).delete(delete_rack_slot))
}

async fn list_rack_groups(
    State(state): State<AppState>,
    Query(query): Query<RackGroupsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let groups = state
        .location_service
        .list_rack_groups(query.warehouse_id)
        .await?;
    Ok(Json(groups))
}

async fn get_rack_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = state.location_service.get_rack_group(id).await?;
    Ok(Json(group))
}

async fn create_rack_group(
    State(state): State<AppState>,
    Json(payload): Json<CreateRackGroup>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = state.location_service.create_rack_group(payload).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_rack_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRackGroup>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = state.location_service.update_rack_group(id, payload).await?;
    Ok(Json(group))
}

async fn delete_rack_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.location_service.delete_rack_group(id).await?;
    Ok(Json(json!({ "ok": true })))
}

async fn list_rack_levels(
    State(state): State<AppState>,
    Query(query): Query<RackLevelsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let levels = state
        .location_service
        .list_rack_levels(query.rack_group_id)
        .await?;
    Ok(Json(levels))
}

async fn create_rack_level(
    State(state): State<AppState>,
    Json(payload): Json<CreateRackLevel>,
) -> Result<impl IntoResponse, ServiceError> {
    let level = state.location_service.create_rack_level(payload).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

async fn update_rack_level(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRackLevel>,
) -> Result<impl IntoResponse, ServiceError> {
    let level = state.location_service.update_rack_level(id, payload).await?;
    Ok(Json(level))
}

async fn delete_rack_level(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.location_service.delete_rack_level(id).await?;
    Ok(Json(json!({ "ok": true })))
}

async fn list_rack_slots(
    State(state): State<AppState>,
    Query(query): Query<RackSlotsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let slots = state
        .location_service
        .list_rack_slots(query.rack_level_id)
        .await?;
    Ok(Json(slots))
}

async fn create_rack_slot(
    State(state): State<AppState>,
    Json(payload): Json<CreateRackSlot>,
) -> Result<impl IntoResponse, ServiceError> {
    let slot = state.location_service.create_rack_slot(payload).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

async fn update_rack_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRackSlot>,
) -> Result<impl IntoResponse, ServiceError> {
    let slot = state.location_service.update_rack_slot(id, payload).await?;
    Ok(Json(slot))
}

async fn delete_rack_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.location_service.delete_rack_slot(id).await?;
    Ok(Json(json!({ "ok": true })))
}
