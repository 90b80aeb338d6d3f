//! Stock ledger endpoints: receive, issue, transfer, manual correction,
//! deletion, and the movement log.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::stock::{MovementFilters, StockFilters, StockMovementRequest};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub quantity: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub warehouse_id: Option<Uuid>,
}

pub fn stock_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock))
        .route("/summary", get(stock_summary))
        .route("/low-stock", get(low_stock))
        .route("/in", post(stock_in))
        .route("/out", post(stock_out))
        .route("/transfer", post(stock_transfer))
        .route(
            "/:id",
            get(get_stock_item).put(adjust_stock).delete(delete_stock),
        )
}

pub fn movements_router() -> Router<AppState> {
    Router::new().route("/", get(list_movements))
}

/// List stock items with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockFilters),
    responses(
        (status = 200, description = "Stock list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    Query(filters): Query<StockFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.stock_service.list_stock(filters).await?;
    Ok(Json(items))
}

pub async fn get_stock_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.stock_service.get_stock_item(id).await?;
    Ok(Json(item))
}

pub async fn stock_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.stock_service.stock_summary(query.warehouse_id).await?;
    Ok(Json(rows))
}

pub async fn low_stock(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.stock_service.low_stock().await?;
    Ok(Json(rows))
}

/// Receive stock into a location
#[utoipa::path(
    post,
    path = "/api/v1/stock/in",
    request_body = StockMovementRequest,
    responses(
        (status = 200, description = "Stock received"),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn stock_in(
    State(state): State<AppState>,
    Json(payload): Json<StockMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.stock_service.stock_in(payload).await?;
    let address = item.full_address.clone();
    Ok(Json(json!({
        "ok": true,
        "stock_item": item,
        "address": address,
    })))
}

/// Issue stock from a location; reserved stock is not eligible
#[utoipa::path(
    post,
    path = "/api/v1/stock/out",
    request_body = StockMovementRequest,
    responses(
        (status = 200, description = "Stock issued"),
        (status = 404, description = "No stock at location", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn stock_out(
    State(state): State<AppState>,
    Json(payload): Json<StockMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.stock_service.stock_out(payload).await?;
    Ok(Json(json!({
        "ok": true,
        "new_quantity": item.quantity,
        "address": item.full_address,
    })))
}

/// Transfer stock between locations
#[utoipa::path(
    post,
    path = "/api/v1/stock/transfer",
    request_body = StockMovementRequest,
    responses(
        (status = 200, description = "Stock transferred"),
        (status = 404, description = "Source stock not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn stock_transfer(
    State(state): State<AppState>,
    Json(payload): Json<StockMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.stock_service.stock_transfer(payload).await?;
    Ok(Json(json!({
        "ok": true,
        "from": result.from_address,
        "to": result.to_address,
        "source_quantity": result.source.quantity,
        "target_quantity": result.target.quantity,
    })))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (old_quantity, item) = state
        .stock_service
        .adjust_quantity(id, payload.quantity, payload.note)
        .await?;
    Ok(Json(json!({
        "ok": true,
        "old_quantity": old_quantity,
        "new_quantity": item.quantity,
    })))
}

pub async fn delete_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.stock_service.delete_stock_item(id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "ok": true, "message": "Stock item deleted" })),
    ))
}

/// Movement log, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(MovementFilters),
    responses(
        (status = 200, description = "Movements returned"),
        (status = 400, description = "Unknown movement type", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(filters): Query<MovementFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state.stock_service.list_movements(filters).await?;
    Ok(Json(movements))
}
