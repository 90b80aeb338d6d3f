//! stockroom-api library
//!
//! Warehouse stock and reservation engine: the location tree, the
//! per-variant stock ledger with its append-only movement log, inventory
//! counts, and the quotation-driven reservation/delivery state machine.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::events::EventSender;
use crate::services::counts::InventoryCountService;
use crate::services::locations::LocationService;
use crate::services::reservations::ReservationService;
use crate::services::stock::StockService;

/// Shared application state: the connection pool, the loaded configuration
/// and the domain services built over them. Services receive their
/// dependencies here, by construction, never through process-wide state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub location_service: LocationService,
    pub stock_service: StockService,
    pub count_service: InventoryCountService,
    pub reservation_service: ReservationService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: EventSender,
    ) -> Self {
        let location_service = LocationService::new(db.clone());
        let stock_service = StockService::new(
            db.clone(),
            event_sender.clone(),
            config.movement_list_limit,
        );
        let count_service = InventoryCountService::new(db.clone(), event_sender.clone());
        let reservation_service = ReservationService::new(
            db.clone(),
            event_sender.clone(),
            config.strict_reservations,
        );

        Self {
            db,
            config,
            event_sender,
            location_service,
            stock_service,
            count_service,
            reservation_service,
        }
    }
}

/// The versioned API surface. Paths mirror the warehouse UI and quotation
/// workflow contracts.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/warehouses", handlers::warehouses::warehouses_router())
        .nest("/rack-groups", handlers::racks::rack_groups_router())
        .nest("/rack-levels", handlers::racks::rack_levels_router())
        .nest("/rack-slots", handlers::racks::rack_slots_router())
        .nest("/stock", handlers::stock::stock_router())
        .nest("/movements", handlers::stock::movements_router())
        .nest("/inventory-counts", handlers::counts::counts_router())
        .nest("/quotations", handlers::quotations::quotations_router())
        .nest("/reports", handlers::reports::reports_router())
        .nest("/health", handlers::health::health_router())
        .merge(openapi::openapi_routes())
}
