//! Post-payment settlement workflow.
//!
//! Converts one payment-gateway callback into a durable state change on an
//! order group, then fans out best-effort notifications. Only the lookup,
//! verify, and commit steps can fail the workflow; everything after the
//! commit is isolated to logs and the notification report.

use crate::{
    config::SettlementReplay,
    entities::{address, cart, cart_item, order, saree, user, Order, PaymentState},
    events::{Event, EventSender},
    services::notifications::{NotificationReport, NotificationService, OrderReceipt},
    services::razorpay::PaymentGateway,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Callback payload posted by the payment gateway's checkout flow.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PaymentCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Terminal failures of the settlement workflow. All variants are rendered
/// identically to the caller; the distinction exists for logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("no orders found for gateway order id")]
    UnknownOrder,
    #[error("payment verification failed")]
    VerificationFailed,
    #[error("database error: {0}")]
    Persistence(#[from] DbErr),
}

/// Result of a successful settlement.
#[derive(Debug)]
pub struct SettlementOutcome {
    pub orders: Vec<order::Model>,
    pub total_amount: i64,
    /// True when the callback hit an already-settled group.
    pub replayed: bool,
    pub notifications: NotificationReport,
}

/// The settlement workflow over injected collaborators.
#[derive(Clone)]
pub struct SettlementService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: Arc<NotificationService>,
    replay: SettlementReplay,
}

impl SettlementService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: Arc<NotificationService>,
        replay: SettlementReplay,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            notifications,
            replay,
        }
    }

    /// Settles the order group referenced by a gateway callback.
    ///
    /// `acting_user` is the authenticated caller whose cart is consumed by
    /// the checkout; the orders themselves may belong to a guest.
    #[instrument(skip(self, callback), fields(gateway_order_id = %callback.razorpay_order_id))]
    pub async fn settle(
        &self,
        callback: PaymentCallback,
        acting_user: Option<Uuid>,
    ) -> Result<SettlementOutcome, SettlementError> {
        // 1. Lookup: a callback naming an order id we never created mutates
        // nothing. Guards against replayed or forged callbacks.
        let orders = Order::find()
            .filter(order::Column::RazorpayOrderId.eq(callback.razorpay_order_id.clone()))
            .all(&*self.db)
            .await?;

        if orders.is_empty() {
            warn!("settlement callback for unknown gateway order id");
            return Err(SettlementError::UnknownOrder);
        }

        // 2. Verify the signature before touching any row.
        if let Err(e) = self.gateway.verify_signature(
            &callback.razorpay_order_id,
            &callback.razorpay_payment_id,
            &callback.razorpay_signature,
        ) {
            error!("payment signature verification failed: {}", e);
            return Err(SettlementError::VerificationFailed);
        }

        let already_settled = orders.iter().all(|o| o.is_paid());
        if already_settled && self.replay == SettlementReplay::Skip {
            info!("replayed callback for settled group; skipping re-commit and notifications");
            let total_amount = orders.iter().map(|o| o.amount).sum();
            return Ok(SettlementOutcome {
                orders,
                total_amount,
                replayed: true,
                notifications: NotificationReport::default(),
            });
        }

        // 3. Commit: the whole group moves together or not at all.
        let txn = self.db.begin().await?;
        for row in &orders {
            let mut active: order::ActiveModel = row.clone().into();
            active.payment_state = Set(PaymentState::Paid);
            active.razorpay_payment_id = Set(Some(callback.razorpay_payment_id.clone()));
            active.razorpay_signature = Set(Some(callback.razorpay_signature.clone()));
            active.update(&txn).await?;
        }
        txn.commit().await?;

        let orders = Order::find()
            .filter(order::Column::RazorpayOrderId.eq(callback.razorpay_order_id.clone()))
            .all(&*self.db)
            .await?;
        let total_amount: i64 = orders.iter().map(|o| o.amount).sum();

        info!(
            order_count = orders.len(),
            total_amount, "order group marked paid"
        );

        // 4. Enrich: receipt metadata is nice to have, never load-bearing.
        let payment = match self
            .gateway
            .fetch_payment(&callback.razorpay_payment_id)
            .await
        {
            Ok(details) => Some(details),
            Err(e) => {
                warn!("could not fetch payment details from gateway: {}", e);
                None
            }
        };

        // 5. Notify: every channel carries its own error boundary.
        let receipts = self.load_receipts(&orders).await;
        let notifications = self
            .notifications
            .notify_order_group(&receipts, payment.as_ref())
            .await;

        // 6. Checkout consumes the caller's cart, whatever the notification
        // outcomes were.
        if let Some(user_id) = acting_user {
            if let Err(e) = self.clear_cart(user_id).await {
                error!("post-settlement cart cleanup failed: {}", e);
            }
        }

        self.event_sender
            .send_or_log(Event::OrderGroupSettled {
                gateway_order_id: callback.razorpay_order_id.clone(),
                order_count: orders.len(),
                total_amount,
            })
            .await;

        Ok(SettlementOutcome {
            orders,
            total_amount,
            replayed: already_settled,
            notifications,
        })
    }

    /// Resolves the saree, address, and customer contact details behind each
    /// order. Lookup failures degrade the receipt instead of failing the
    /// settlement: the group is already committed by the time this runs.
    async fn load_receipts(&self, orders: &[order::Model]) -> Vec<OrderReceipt> {
        let mut receipts = Vec::with_capacity(orders.len());
        for row in orders {
            match self.load_receipt(row).await {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    error!(order = %row.reference(), "receipt lookup failed: {}", e);
                    receipts.push(bare_receipt(row));
                }
            }
        }
        receipts
    }

    async fn load_receipt(&self, row: &order::Model) -> Result<OrderReceipt, DbErr> {
        let saree_name = saree::Entity::find_by_id(row.saree_id)
            .one(&*self.db)
            .await?
            .map(|s| s.name)
            .unwrap_or_else(|| "Item".to_string());

        let delivery_address = match row.delivery_address_id {
            Some(id) => address::Entity::find_by_id(id).one(&*self.db).await?,
            None => None,
        };

        let buyer = match row.user_id {
            Some(id) => user::Entity::find_by_id(id).one(&*self.db).await?,
            None => None,
        };

        let customer_name = delivery_address
            .as_ref()
            .map(|a| a.full_name.clone())
            .or_else(|| buyer.as_ref().map(|u| u.full_name.clone()))
            .or_else(|| row.guest_name.clone())
            .unwrap_or_else(|| "Customer".to_string());

        let customer_email = buyer
            .as_ref()
            .map(|u| u.email.clone())
            .or_else(|| row.guest_email.clone());

        let customer_phone = delivery_address
            .as_ref()
            .map(|a| a.phone.clone())
            .or_else(|| buyer.as_ref().and_then(|u| u.mobile_number.clone()))
            .or_else(|| row.guest_phone.clone());

        Ok(OrderReceipt {
            order: row.clone(),
            saree_name,
            delivery_address,
            customer_name,
            customer_email,
            customer_phone,
        })
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<(), DbErr> {
        let Some(cart) = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
        else {
            return Ok(());
        };

        let deleted = cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&*self.db)
            .await?;

        if deleted.rows_affected > 0 {
            info!(%user_id, items = deleted.rows_affected, "cart emptied after settlement");
            self.event_sender.send_or_log(Event::CartCleared(cart.id)).await;
        }
        Ok(())
    }
}

fn bare_receipt(row: &order::Model) -> OrderReceipt {
    OrderReceipt {
        order: row.clone(),
        saree_name: "Item".to_string(),
        delivery_address: None,
        customer_name: row
            .guest_name
            .clone()
            .unwrap_or_else(|| "Customer".to_string()),
        customer_email: row.guest_email.clone(),
        customer_phone: row.guest_phone.clone(),
    }
}
