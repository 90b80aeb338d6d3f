//! Read-only reporting endpoints over the stock ledger. Each report is
//! point-in-time consistent with the last committed write; a multi-query
//! report is not a snapshot across queries.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::errors::ServiceError;
use crate::AppState;

pub fn reports_router() -> Router<AppState> {
    Router::new()
        .route("/by-warehouse", get(report_by_warehouse))
        .route("/by-product", get(report_by_product))
}

async fn report_by_warehouse(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.stock_service.report_by_warehouse().await?;
    Ok(Json(rows))
}

async fn report_by_product(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.stock_service.stock_summary(None).await?;
    Ok(Json(rows))
}
