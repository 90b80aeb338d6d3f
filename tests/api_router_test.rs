mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use stockroom_api::config::AppConfig;
use stockroom_api::middleware_helpers::request_id::request_id_middleware;
use stockroom_api::{api_v1_routes, AppState};

use common::{event_channel, movement_request, seed_location, setup_db};

fn test_app(db: Arc<DatabaseConnection>) -> Router {
    let (events, _rx) = event_channel();
    let state = AppState::new(db, AppConfig::default(), events);
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let db = setup_db().await;
    let app = test_app(db);

    let response = app.oneshot(get_request("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn warehouse_creation_conflicts_on_duplicate_code() {
    let db = setup_db().await;
    let app = test_app(db);

    let payload = json!({ "name": "Main", "code": "MN" });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/warehouses", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/warehouses", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Errors carry the structured payload with a request id
    assert!(response.headers().get("x-request-id").is_some());
    let body = body_json(response).await;
    assert_eq!(body["error"], "Conflict");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn unknown_warehouse_returns_not_found() {
    let db = setup_db().await;
    let app = test_app(db);

    let response = app
        .oneshot(get_request(&format!("/api/v1/warehouses/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_in_and_out_round_trip_over_http() {
    let db = setup_db().await;
    let key = seed_location(db.clone()).await;
    let app = test_app(db);

    let product = Uuid::new_v4();
    let request = movement_request(&key, product, "V1", dec!(10));
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/stock/in",
            request_body(&request, dec!(10)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["address"], "Main / A / 1. level / Slot 1");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/stock/out",
            request_body(&request, dec!(4)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let raw_quantity = body["new_quantity"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| body["new_quantity"].to_string());
    let remaining: rust_decimal::Decimal = raw_quantity.parse().unwrap();
    assert_eq!(remaining, dec!(6));

    // Over-draw fails with 422 and the taxonomy message
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/stock/out",
            request_body(&request, dec!(10)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient stock"));

    let response = app
        .oneshot(get_request("/api/v1/movements?movement_type=OUT"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let db = setup_db().await;
    let app = test_app(db);

    let response = app.oneshot(get_request("/api/v1/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/v1/stock/in"].is_object());
}

fn request_body(
    base: &stockroom_api::services::stock::StockMovementRequest,
    quantity: rust_decimal::Decimal,
) -> Value {
    json!({
        "warehouse_id": base.warehouse_id,
        "rack_group_id": base.rack_group_id,
        "rack_level_id": base.rack_level_id,
        "rack_slot_id": base.rack_slot_id,
        "product_id": base.product_id,
        "variant_id": base.variant_id,
        "quantity": quantity,
    })
}
