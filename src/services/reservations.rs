//! The reservation/delivery state machine.
//!
//! Quotation lifecycle events drive the ledger: acceptance reserves stock,
//! leaving acceptance releases it, delivery converts reservations into real
//! decrements, and a delivery revert restores them. Each transition is one
//! transaction over an explicit reservation ledger (`stock_reservations`),
//! so release and revert touch exactly the rows the earlier transition
//! wrote instead of re-walking stock heuristically.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    quotation::{self, DeliveryStatus, Entity as QuotationEntity, OfferStatus},
    quotation_line::{self, Entity as QuotationLineEntity},
    stock_item::{self, Entity as StockItemEntity},
    stock_movement::MovementType,
    stock_reservation::{self, Entity as StockReservationEntity, ReservationStatus},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::locations::LocationKey;
use crate::services::stock::movement_row;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OfferStatusChange {
    pub offer_status: String,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Requested vs actually applied quantity for one quotation line.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LineFulfillment {
    pub quotation_line_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: String,
    pub requested: Decimal,
    pub fulfilled: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResult {
    pub quotation: quotation::Model,
    pub previous_status: String,
    /// Per-line reservation report when the transition entered "accepted".
    pub reserved: Vec<LineFulfillment>,
    /// Per-line release report when the transition left "accepted".
    pub released: Vec<LineFulfillment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub quotation: quotation::Model,
    pub lines: Vec<LineFulfillment>,
}

fn item_location(item: &stock_item::Model) -> LocationKey {
    LocationKey {
        warehouse_id: item.warehouse_id,
        rack_group_id: item.rack_group_id,
        rack_level_id: item.rack_level_id,
        rack_slot_id: item.rack_slot_id,
    }
}

/// Stock items of one product in allocation order. The explicit
/// (created_at, id) ordering keeps reservation walks deterministic.
async fn product_stock_in_order(
    txn: &DatabaseTransaction,
    product_id: Uuid,
) -> Result<Vec<stock_item::Model>, ServiceError> {
    Ok(StockItemEntity::find()
        .filter(stock_item::Column::ProductId.eq(product_id))
        .order_by_asc(stock_item::Column::CreatedAt)
        .order_by_asc(stock_item::Column::Id)
        .all(txn)
        .await?)
}

/// Non-optional lines with a product and a positive quantity, in creation
/// order. Only these ever touch stock.
async fn reservable_lines(
    txn: &DatabaseTransaction,
    quotation_id: Uuid,
) -> Result<Vec<quotation_line::Model>, ServiceError> {
    let lines = QuotationLineEntity::find()
        .filter(quotation_line::Column::QuotationId.eq(quotation_id))
        .order_by_asc(quotation_line::Column::CreatedAt)
        .all(txn)
        .await?;
    Ok(lines
        .into_iter()
        .filter(|line| {
            !line.is_optional && line.product_id.is_some() && line.quantity > Decimal::ZERO
        })
        .collect())
}

/// Service bridging quotation lifecycle events to ledger mutations.
#[derive(Clone)]
pub struct ReservationService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    /// Reject-on-shortfall when true; legacy silent partial fill when false.
    strict: bool,
}

impl ReservationService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender, strict: bool) -> Self {
        Self {
            db_pool,
            event_sender,
            strict,
        }
    }

    /// Applies an offer-status transition and its stock side effects:
    /// entering "accepted" reserves, leaving it releases. Re-asserting the
    /// current status is a no-op on stock.
    #[instrument(skip(self, change))]
    pub async fn set_offer_status(
        &self,
        quotation_id: Uuid,
        change: OfferStatusChange,
    ) -> Result<StatusChangeResult, ServiceError> {
        let requested = change.offer_status.trim().to_lowercase();
        let new_status = OfferStatus::from_str(&requested)
            .ok_or_else(|| ServiceError::ValidationError("Invalid offer_status".to_string()))?;
        let rejection_reason = change
            .rejection_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let strict = self.strict;
        let db = self.db_pool.as_ref();
        let result = db
            .transaction::<_, StatusChangeResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = QuotationEntity::find_by_id(quotation_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Quotation not found".to_string())
                        })?;

                    let previous = OfferStatus::from_str(&existing.offer_status)
                        .unwrap_or(OfferStatus::Pending);
                    let previous_status = existing.offer_status.clone();
                    let number = existing.number.clone();

                    let mut reserved = Vec::new();
                    let mut released = Vec::new();

                    if new_status == OfferStatus::Accepted && previous != OfferStatus::Accepted {
                        reserved = reserve_for_quotation(txn, &existing, strict).await?;
                    } else if previous == OfferStatus::Accepted
                        && new_status != OfferStatus::Accepted
                    {
                        released = release_for_quotation(txn, quotation_id, &number).await?;
                    }

                    let mut active: quotation::ActiveModel = existing.into();
                    active.offer_status = Set(new_status.as_str().to_string());
                    active.rejection_reason = Set(match new_status {
                        OfferStatus::Rejected => rejection_reason,
                        _ => None,
                    });
                    let quotation = active.update(txn).await?;

                    Ok(StatusChangeResult {
                        quotation,
                        previous_status,
                        reserved,
                        released,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            %quotation_id,
            new_status = %result.quotation.offer_status,
            reserved_lines = result.reserved.len(),
            released_lines = result.released.len(),
            "Quotation status changed"
        );
        self.event_sender
            .send_or_log(Event::QuotationStatusChanged {
                quotation_id,
                old_status: result.previous_status.clone(),
                new_status: result.quotation.offer_status.clone(),
                reserved_slices: result.reserved.len(),
                released_slices: result.released.len(),
            })
            .await;

        Ok(result)
    }

    /// Converts the quotation's reservations into real stock decrements and
    /// marks it delivered. Requires an accepted, not-yet-delivered
    /// quotation.
    #[instrument(skip(self))]
    pub async fn commit_delivery(
        &self,
        quotation_id: Uuid,
    ) -> Result<DeliveryResult, ServiceError> {
        let strict = self.strict;
        let db = self.db_pool.as_ref();
        let result = db
            .transaction::<_, DeliveryResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = QuotationEntity::find_by_id(quotation_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Quotation not found".to_string())
                        })?;

                    if OfferStatus::from_str(&existing.offer_status) != Some(OfferStatus::Accepted)
                    {
                        return Err(ServiceError::InvalidState(
                            "Only accepted quotations can be delivered".to_string(),
                        ));
                    }
                    if DeliveryStatus::from_str(&existing.delivery_status)
                        == Some(DeliveryStatus::Delivered)
                    {
                        return Err(ServiceError::Conflict(
                            "Quotation already delivered".to_string(),
                        ));
                    }

                    let number = existing.number.clone();
                    let lines = reservable_lines(txn, quotation_id).await?;
                    let mut reports = Vec::with_capacity(lines.len());

                    for line in lines {
                        let Some(product_id) = line.product_id else {
                            continue;
                        };
                        let mut delivered = Decimal::ZERO;
                        let mut remaining = line.quantity;

                        // First consume this line's own reservations.
                        let holds = StockReservationEntity::find()
                            .filter(stock_reservation::Column::QuotationLineId.eq(line.id))
                            .filter(
                                stock_reservation::Column::Status
                                    .eq(ReservationStatus::Active.as_str()),
                            )
                            .order_by_asc(stock_reservation::Column::CreatedAt)
                            .all(txn)
                            .await?;

                        for hold in holds {
                            if remaining <= Decimal::ZERO {
                                break;
                            }
                            let item = StockItemEntity::find_by_id(hold.stock_item_id)
                                .one(txn)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::InternalError(
                                        "Reserved stock item vanished".to_string(),
                                    )
                                })?;

                            let take = hold.quantity.min(remaining);
                            let new_quantity = (item.quantity - take).max(Decimal::ZERO);
                            let new_reserved =
                                (item.reserved_quantity - take).max(Decimal::ZERO);
                            let location = item_location(&item);
                            let variant_id = item.variant_id.clone();
                            let variant_name = item.variant_name.clone();
                            let address = item.full_address.clone();

                            let mut active: stock_item::ActiveModel = item.into();
                            active.quantity = Set(new_quantity);
                            active.reserved_quantity = Set(new_reserved);
                            active.update(txn).await?;

                            movement_row(
                                MovementType::Out,
                                &location,
                                None,
                                product_id,
                                variant_id,
                                variant_name,
                                -take,
                                address,
                                None,
                                Some(format!("Quotation {} delivery", number)),
                                None,
                            )
                            .insert(txn)
                            .await?;

                            let mut active_hold: stock_reservation::ActiveModel = hold.into();
                            active_hold.status =
                                Set(ReservationStatus::Consumed.as_str().to_string());
                            active_hold.update(txn).await?;

                            delivered += take;
                            remaining -= take;
                        }

                        // Any shortfall draws from unreserved stock, so a
                        // lenient setup behaves like the legacy system.
                        if remaining > Decimal::ZERO {
                            for item in product_stock_in_order(txn, product_id).await? {
                                if remaining <= Decimal::ZERO {
                                    break;
                                }
                                let take = item.available().min(remaining);
                                if take <= Decimal::ZERO {
                                    continue;
                                }

                                let new_quantity = item.quantity - take;
                                let location = item_location(&item);
                                let variant_id = item.variant_id.clone();
                                let variant_name = item.variant_name.clone();
                                let address = item.full_address.clone();
                                let item_id = item.id;

                                let mut active: stock_item::ActiveModel = item.into();
                                active.quantity = Set(new_quantity);
                                active.update(txn).await?;

                                movement_row(
                                    MovementType::Out,
                                    &location,
                                    None,
                                    product_id,
                                    variant_id.clone(),
                                    variant_name,
                                    -take,
                                    address,
                                    None,
                                    Some(format!("Quotation {} delivery", number)),
                                    None,
                                )
                                .insert(txn)
                                .await?;

                                // Recorded as consumed so a revert can put
                                // the stock back where it was taken from.
                                stock_reservation::ActiveModel {
                                    quotation_id: Set(quotation_id),
                                    quotation_line_id: Set(line.id),
                                    stock_item_id: Set(item_id),
                                    product_id: Set(product_id),
                                    variant_id: Set(variant_id),
                                    quantity: Set(take),
                                    status: Set(
                                        ReservationStatus::Consumed.as_str().to_string()
                                    ),
                                    released_at: Set(None),
                                    ..Default::default()
                                }
                                .insert(txn)
                                .await?;

                                delivered += take;
                                remaining -= take;
                            }
                        }

                        if strict && remaining > Decimal::ZERO {
                            return Err(ServiceError::InsufficientStock(format!(
                                "quotation {} line {}: requested {}, deliverable {}",
                                number, line.id, line.quantity, delivered
                            )));
                        }

                        reports.push(LineFulfillment {
                            quotation_line_id: line.id,
                            product_id,
                            variant_id: line.variant_key(),
                            requested: line.quantity,
                            fulfilled: delivered,
                        });
                    }

                    let mut active: quotation::ActiveModel = existing.into();
                    active.delivery_status = Set(DeliveryStatus::Delivered.as_str().to_string());
                    active.delivered_at = Set(Some(chrono::Utc::now()));
                    let quotation = active.update(txn).await?;

                    Ok(DeliveryResult {
                        quotation,
                        lines: reports,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(%quotation_id, lines = result.lines.len(), "Quotation delivered");
        self.event_sender
            .send_or_log(Event::QuotationDelivered {
                quotation_id,
                lines_delivered: result.lines.len(),
            })
            .await;

        Ok(result)
    }

    /// Undoes a delivery: every consumed reservation slice returns to the
    /// exact stock item it was taken from, with on-hand and reserved both
    /// restored, and the quotation goes back to delivery-pending.
    #[instrument(skip(self))]
    pub async fn revert_delivery(
        &self,
        quotation_id: Uuid,
    ) -> Result<DeliveryResult, ServiceError> {
        let db = self.db_pool.as_ref();
        let result = db
            .transaction::<_, DeliveryResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = QuotationEntity::find_by_id(quotation_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Quotation not found".to_string())
                        })?;

                    if DeliveryStatus::from_str(&existing.delivery_status)
                        != Some(DeliveryStatus::Delivered)
                    {
                        return Err(ServiceError::InvalidState(
                            "Quotation has not been delivered".to_string(),
                        ));
                    }

                    let number = existing.number.clone();
                    let consumed = StockReservationEntity::find()
                        .filter(stock_reservation::Column::QuotationId.eq(quotation_id))
                        .filter(
                            stock_reservation::Column::Status
                                .eq(ReservationStatus::Consumed.as_str()),
                        )
                        .order_by_asc(stock_reservation::Column::CreatedAt)
                        .all(txn)
                        .await?;

                    let mut per_line: BTreeMap<Uuid, LineFulfillment> = BTreeMap::new();

                    for hold in consumed {
                        let item = StockItemEntity::find_by_id(hold.stock_item_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::InternalError(
                                    "Consumed stock item vanished".to_string(),
                                )
                            })?;

                        let new_quantity = item.quantity + hold.quantity;
                        let new_reserved = item.reserved_quantity + hold.quantity;
                        let location = item_location(&item);
                        let variant_id = item.variant_id.clone();
                        let variant_name = item.variant_name.clone();
                        let address = item.full_address.clone();

                        let mut active: stock_item::ActiveModel = item.into();
                        active.quantity = Set(new_quantity);
                        active.reserved_quantity = Set(new_reserved);
                        active.update(txn).await?;

                        movement_row(
                            MovementType::In,
                            &location,
                            None,
                            hold.product_id,
                            variant_id,
                            variant_name,
                            hold.quantity,
                            address,
                            None,
                            Some(format!("Quotation {} delivery reverted", number)),
                            None,
                        )
                        .insert(txn)
                        .await?;

                        let entry =
                            per_line
                                .entry(hold.quotation_line_id)
                                .or_insert(LineFulfillment {
                                    quotation_line_id: hold.quotation_line_id,
                                    product_id: hold.product_id,
                                    variant_id: hold.variant_id.clone(),
                                    requested: Decimal::ZERO,
                                    fulfilled: Decimal::ZERO,
                                });
                        entry.requested += hold.quantity;
                        entry.fulfilled += hold.quantity;

                        let mut active_hold: stock_reservation::ActiveModel = hold.into();
                        active_hold.status = Set(ReservationStatus::Active.as_str().to_string());
                        active_hold.update(txn).await?;
                    }

                    let mut active: quotation::ActiveModel = existing.into();
                    active.delivery_status = Set(DeliveryStatus::Pending.as_str().to_string());
                    active.delivered_at = Set(None);
                    let quotation = active.update(txn).await?;

                    Ok(DeliveryResult {
                        quotation,
                        lines: per_line.into_values().collect(),
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(%quotation_id, lines = result.lines.len(), "Delivery reverted");
        self.event_sender
            .send_or_log(Event::DeliveryReverted {
                quotation_id,
                lines_restored: result.lines.len(),
            })
            .await;

        Ok(result)
    }

    /// Reservation slices for a quotation, newest first. Read-only view for
    /// the API surface.
    #[instrument(skip(self))]
    pub async fn list_reservations(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<stock_reservation::Model>, ServiceError> {
        Ok(StockReservationEntity::find()
            .filter(stock_reservation::Column::QuotationId.eq(quotation_id))
            .order_by_desc(stock_reservation::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?)
    }
}

/// Reserves stock for every non-optional line of a freshly accepted
/// quotation. Strict mode refuses the whole transition when a line cannot
/// be covered by the product's available stock.
async fn reserve_for_quotation(
    txn: &DatabaseTransaction,
    quotation: &quotation::Model,
    strict: bool,
) -> Result<Vec<LineFulfillment>, ServiceError> {
    let lines = reservable_lines(txn, quotation.id).await?;
    let mut reports = Vec::with_capacity(lines.len());

    for line in lines {
        let Some(product_id) = line.product_id else {
            continue;
        };
        let items = product_stock_in_order(txn, product_id).await?;

        if strict {
            let total_available: Decimal = items
                .iter()
                .map(|item| item.available().max(Decimal::ZERO))
                .sum();
            if total_available < line.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "quotation {} line {}: requested {}, available {}",
                    quotation.number, line.id, line.quantity, total_available
                )));
            }
        }

        let mut remaining = line.quantity;
        for item in items {
            if remaining <= Decimal::ZERO {
                break;
            }
            let reserve = item.available().max(Decimal::ZERO).min(remaining);
            if reserve <= Decimal::ZERO {
                continue;
            }

            let new_reserved = item.reserved_quantity + reserve;
            let location = item_location(&item);
            let variant_id = item.variant_id.clone();
            let variant_name = item.variant_name.clone();
            let address = item.full_address.clone();
            let item_id = item.id;

            let mut active: stock_item::ActiveModel = item.into();
            active.reserved_quantity = Set(new_reserved);
            active.update(txn).await?;

            stock_reservation::ActiveModel {
                quotation_id: Set(quotation.id),
                quotation_line_id: Set(line.id),
                stock_item_id: Set(item_id),
                product_id: Set(product_id),
                variant_id: Set(line.variant_key()),
                quantity: Set(reserve),
                status: Set(ReservationStatus::Active.as_str().to_string()),
                released_at: Set(None),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            movement_row(
                MovementType::Reserve,
                &location,
                None,
                product_id,
                variant_id,
                variant_name,
                reserve,
                address,
                None,
                Some(format!("Quotation {}", quotation.number)),
                None,
            )
            .insert(txn)
            .await?;

            remaining -= reserve;
        }

        reports.push(LineFulfillment {
            quotation_line_id: line.id,
            product_id,
            variant_id: line.variant_key(),
            requested: line.quantity,
            fulfilled: line.quantity - remaining,
        });
    }

    Ok(reports)
}

/// Releases every active reservation slice of a quotation, exactly.
async fn release_for_quotation(
    txn: &DatabaseTransaction,
    quotation_id: Uuid,
    number: &str,
) -> Result<Vec<LineFulfillment>, ServiceError> {
    let holds = StockReservationEntity::find()
        .filter(stock_reservation::Column::QuotationId.eq(quotation_id))
        .filter(stock_reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
        .order_by_asc(stock_reservation::Column::CreatedAt)
        .all(txn)
        .await?;

    let mut per_line: BTreeMap<Uuid, LineFulfillment> = BTreeMap::new();

    for hold in holds {
        let item = StockItemEntity::find_by_id(hold.stock_item_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError("Reserved stock item vanished".to_string())
            })?;

        let new_reserved = (item.reserved_quantity - hold.quantity).max(Decimal::ZERO);
        let location = item_location(&item);
        let variant_id = item.variant_id.clone();
        let variant_name = item.variant_name.clone();
        let address = item.full_address.clone();

        let mut active: stock_item::ActiveModel = item.into();
        active.reserved_quantity = Set(new_reserved);
        active.update(txn).await?;

        movement_row(
            MovementType::Unreserve,
            &location,
            None,
            hold.product_id,
            variant_id,
            variant_name,
            -hold.quantity,
            address,
            None,
            Some(format!("Quotation {}", number)),
            None,
        )
        .insert(txn)
        .await?;

        let entry = per_line
            .entry(hold.quotation_line_id)
            .or_insert(LineFulfillment {
                quotation_line_id: hold.quotation_line_id,
                product_id: hold.product_id,
                variant_id: hold.variant_id.clone(),
                requested: Decimal::ZERO,
                fulfilled: Decimal::ZERO,
            });
        entry.requested += hold.quantity;
        entry.fulfilled += hold.quantity;

        let mut active_hold: stock_reservation::ActiveModel = hold.into();
        active_hold.status = Set(ReservationStatus::Released.as_str().to_string());
        active_hold.released_at = Set(Some(chrono::Utc::now()));
        active_hold.update(txn).await?;
    }

    Ok(per_line.into_values().collect())
}
