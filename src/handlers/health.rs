use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::errors::ServiceError;
use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// Liveness + database reachability
async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    crate::db::check_connection(state.db.as_ref()).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
