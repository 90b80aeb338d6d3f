//! Quotation lifecycle endpoints consumed by the quotation workflow:
//! offer-status changes and the delivery sub-state. Quotation CRUD itself
//! lives with the workflow that owns the documents, not here.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::reservations::OfferStatusChange;
use crate::AppState;

pub fn quotations_router() -> Router<AppState> {
    Router::new()
        .route("/:id/status", patch(set_offer_status))
        .route("/:id/deliver", post(deliver))
        .route("/:id/revert-delivery", post(revert_delivery))
        .route("/:id/reservations", get(list_reservations))
}

/// Change the offer status; entering "accepted" reserves stock for every
/// non-optional line, leaving it releases the holds again.
#[utoipa::path(
    patch,
    path = "/api/v1/quotations/{id}/status",
    request_body = OfferStatusChange,
    responses(
        (status = 200, description = "Status changed; fulfillment report returned"),
        (status = 400, description = "Invalid offer_status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock to reserve", body = crate::errors::ErrorResponse)
    ),
    tag = "quotations"
)]
pub async fn set_offer_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OfferStatusChange>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.reservation_service.set_offer_status(id, payload).await?;
    Ok(Json(result))
}

/// Deliver an accepted quotation, converting its reservations into real
/// stock decrements
#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/deliver",
    responses(
        (status = 200, description = "Delivered; per-line report returned"),
        (status = 400, description = "Quotation not accepted", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already delivered", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "quotations"
)]
pub async fn deliver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.reservation_service.commit_delivery(id).await?;
    Ok(Json(json!({
        "ok": true,
        "delivery_status": result.quotation.delivery_status,
        "lines": result.lines,
    })))
}

pub async fn revert_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.reservation_service.revert_delivery(id).await?;
    Ok(Json(json!({
        "ok": true,
        "delivery_status": result.quotation.delivery_status,
        "lines": result.lines,
    })))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reservations = state.reservation_service.list_reservations(id).await?;
    Ok(Json(reservations))
}
