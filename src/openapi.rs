//! OpenAPI document for the primary endpoints, served as JSON.

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::stock::list_stock,
        crate::handlers::stock::stock_in,
        crate::handlers::stock::stock_out,
        crate::handlers::stock::stock_transfer,
        crate::handlers::stock::list_movements,
        crate::handlers::quotations::set_offer_status,
        crate::handlers::quotations::deliver,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::locations::CreateWarehouse,
        crate::services::stock::StockMovementRequest,
        crate::services::stock::StockSummaryRow,
        crate::services::stock::LowStockRow,
        crate::services::counts::CreateInventoryCount,
        crate::services::reservations::OfferStatusChange,
        crate::services::reservations::LineFulfillment,
        crate::handlers::stock::AdjustStockRequest,
    )),
    tags(
        (name = "warehouses", description = "Warehouse location tree"),
        (name = "stock", description = "Stock ledger operations"),
        (name = "movements", description = "Append-only movement log"),
        (name = "quotations", description = "Reservation and delivery lifecycle"),
    ),
    info(
        title = "stockroom-api",
        description = "Warehouse stock and reservation engine"
    )
)]
pub struct ApiDoc;

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn openapi_routes() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/v1/stock/in"));
        assert!(json.contains("stockroom-api"));
    }
}
