use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted after a stock mutation commits. Consumers are
/// fire-and-forget; a full channel degrades to a warning, never a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        stock_item_id: Uuid,
        product_id: Uuid,
        variant_id: String,
        quantity: Decimal,
    },
    StockIssued {
        stock_item_id: Uuid,
        product_id: Uuid,
        variant_id: String,
        quantity: Decimal,
    },
    StockTransferred {
        source_stock_item_id: Uuid,
        target_stock_item_id: Uuid,
        product_id: Uuid,
        variant_id: String,
        quantity: Decimal,
    },
    StockAdjusted {
        stock_item_id: Uuid,
        old_quantity: Decimal,
        new_quantity: Decimal,
    },
    StockDeleted {
        stock_item_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    },
    InventoryCountApproved {
        count_id: Uuid,
        adjustment: Decimal,
    },
    QuotationStatusChanged {
        quotation_id: Uuid,
        old_status: String,
        new_status: String,
        reserved_slices: usize,
        released_slices: usize,
    },
    QuotationDelivered {
        quotation_id: Uuid,
        lines_delivered: usize,
    },
    DeliveryReverted {
        quotation_id: Uuid,
        lines_restored: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    /// Services call this after their transaction commits.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "Dropping event");
        }
    }
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::QuotationStatusChanged {
                quotation_id,
                old_status,
                new_status,
                ..
            } => {
                info!(%quotation_id, %old_status, %new_status, "Quotation status changed");
            }
            Event::QuotationDelivered {
                quotation_id,
                lines_delivered,
            } => {
                info!(%quotation_id, lines_delivered, "Quotation delivered");
            }
            other => info!(event = ?other, "Stock event"),
        }
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::StockAdjusted {
                stock_item_id: Uuid::new_v4(),
                old_quantity: dec!(3),
                new_quantity: dec!(5),
            })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(Event::StockAdjusted { .. })
        ));
    }

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or return an error to the caller
        sender
            .send_or_log(Event::DeliveryReverted {
                quotation_id: Uuid::new_v4(),
                lines_restored: 0,
            })
            .await;
    }
}
