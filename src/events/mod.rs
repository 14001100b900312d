use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the storefront services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),

    // Address book events
    AddressCreated { user_id: Uuid, address_id: Uuid },
    AddressUpdated { user_id: Uuid, address_id: Uuid },
    AddressDeleted { user_id: Uuid, address_id: Uuid },

    // Cart events
    CartCreated(Uuid),
    CartItemAdded { cart_id: Uuid, saree_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },
    CartCleared(Uuid),

    // Checkout events
    CheckoutStarted {
        gateway_order_id: String,
        order_count: usize,
        total_amount: i64,
    },
    OrderCreated(Uuid),

    // Settlement events
    OrderGroupSettled {
        gateway_order_id: String,
        order_count: usize,
        total_amount: i64,
    },
}

/// Cloneable handle for publishing events onto the process-wide channel.
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

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery is never allowed to fail a service operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Background consumer for the event channel. Settlement and checkout do not
/// depend on this loop; it exists for logging and future fan-in.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderGroupSettled {
                gateway_order_id,
                order_count,
                total_amount,
            } => {
                info!(
                    %gateway_order_id,
                    order_count,
                    total_amount,
                    "order group settled"
                );
            }
            Event::CheckoutStarted {
                gateway_order_id,
                order_count,
                total_amount,
            } => {
                info!(
                    %gateway_order_id,
                    order_count,
                    total_amount,
                    "checkout started"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::CartCreated(Uuid::new_v4()))
            .await
            .expect("send should succeed");

        assert!(matches!(rx.recv().await, Some(Event::CartCreated(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error.
        sender.send_or_log(Event::CartCleared(Uuid::new_v4())).await;
    }
}
