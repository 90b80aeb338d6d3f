use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::locations::{CreateWarehouse, UpdateWarehouse};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ListWarehousesQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct DeleteWarehouseQuery {
    #[serde(default)]
    pub hard: bool,
}

pub fn warehouses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route(
            "/:id",
            get(get_warehouse)
                .put(update_warehouse)
                .delete(delete_warehouse),
        )
}

/// List warehouses, active first by name
#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(ListWarehousesQuery),
    responses(
        (status = 200, description = "Warehouse list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<ListWarehousesQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state
        .location_service
        .list_warehouses(query.include_deleted)
        .await?;
    Ok(Json(warehouses))
}

pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.location_service.get_warehouse(id).await?;
    Ok(Json(warehouse))
}

/// Create a warehouse; codes are unique among non-deleted warehouses
#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouse,
    responses(
        (status = 201, description = "Warehouse created"),
        (status = 409, description = "Duplicate code", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(payload): Json<CreateWarehouse>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.location_service.create_warehouse(payload).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWarehouse>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.location_service.update_warehouse(id, payload).await?;
    Ok(Json(warehouse))
}

pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteWarehouseQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state.location_service.delete_warehouse(id, query.hard).await?;
    Ok(Json(json!({ "ok": true })))
}
