//! Checkout initiation: allocates a gateway order and creates the pending
//! order rows that the settlement workflow later transitions.

use crate::{
    config::AppConfig,
    entities::{cart, cart_item, order, saree, Cart, CartItem, PaymentState, Saree},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{addresses::AddressService, razorpay::PaymentGateway},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Everything a payment page needs to open the gateway checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutContext {
    pub razorpay_order_id: String,
    /// Amount handed to the gateway, in paise.
    pub amount: i64,
    /// The same amount in whole rupees.
    pub total_amount: i64,
    pub currency: String,
    /// Key id the frontend passes to the gateway's checkout widget.
    pub razorpay_key_id: String,
    pub orders: Vec<order::Model>,
}

/// Checkout service over the injected payment gateway.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn PaymentGateway>,
    addresses: Arc<AddressService>,
    config: Arc<AppConfig>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        addresses: Arc<AddressService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            addresses,
            config,
        }
    }

    /// Buy-now: one saree, one order row, one fresh gateway order.
    #[instrument(skip(self))]
    pub async fn buy_now(
        &self,
        user_id: Uuid,
        saree_id: Uuid,
        address_id: Uuid,
    ) -> Result<CheckoutContext, ServiceError> {
        let address = self.addresses.get_owned(user_id, address_id).await?;

        let saree = Saree::find_by_id(saree_id)
            .filter(saree::Column::Available.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Saree {} not found", saree_id)))?;

        let total_amount = saree.price;
        let gateway_order = self.create_gateway_order(total_amount).await?;

        let row = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            saree_id: Set(saree.id),
            user_id: Set(Some(user_id)),
            quantity: Set(1),
            delivery_address_id: Set(Some(address.id)),
            guest_name: Set(None),
            guest_email: Set(None),
            guest_phone: Set(None),
            guest_address: Set(None),
            razorpay_order_id: Set(gateway_order.id.clone()),
            razorpay_payment_id: Set(None),
            razorpay_signature: Set(None),
            payment_state: Set(PaymentState::Pending),
            amount: Set(saree.price),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(row.id))
            .await;
        self.event_sender
            .send_or_log(Event::CheckoutStarted {
                gateway_order_id: gateway_order.id.clone(),
                order_count: 1,
                total_amount,
            })
            .await;

        info!(
            "buy-now checkout started: order {} under gateway order {}",
            row.id, gateway_order.id
        );

        Ok(CheckoutContext {
            razorpay_order_id: gateway_order.id,
            amount: total_amount * 100,
            total_amount,
            currency: self.config.default_currency.clone(),
            razorpay_key_id: self.config.razorpay_key_id.clone(),
            orders: vec![row],
        })
    }

    /// Cart checkout: one order row per cart line, all sharing one freshly
    /// allocated gateway order id. The cart itself is consumed later, by
    /// settlement.
    #[instrument(skip(self))]
    pub async fn checkout_cart(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<CheckoutContext, ServiceError> {
        let address = self.addresses.get_owned(user_id, address_id).await?;

        let cart = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InvalidOperation("Your cart is empty".to_string()))?;

        let items = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&*self.db)
            .await?;
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation("Your cart is empty".to_string()));
        }

        // Resolve each line's saree before any remote or persistent effect.
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let saree = Saree::find_by_id(item.saree_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Saree {} not found", item.saree_id))
                })?;
            lines.push((item.clone(), saree));
        }

        let total_amount: i64 = lines.iter().map(|(_, saree)| saree.price).sum();
        let gateway_order = self.create_gateway_order(total_amount).await?;

        let txn = self.db.begin().await?;
        let mut orders = Vec::with_capacity(lines.len());
        for (item, saree) in &lines {
            let row = order::ActiveModel {
                id: Set(Uuid::new_v4()),
                saree_id: Set(saree.id),
                user_id: Set(Some(user_id)),
                quantity: Set(item.quantity),
                delivery_address_id: Set(Some(address.id)),
                guest_name: Set(None),
                guest_email: Set(None),
                guest_phone: Set(None),
                guest_address: Set(None),
                razorpay_order_id: Set(gateway_order.id.clone()),
                razorpay_payment_id: Set(None),
                razorpay_signature: Set(None),
                payment_state: Set(PaymentState::Pending),
                amount: Set(saree.price),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
            orders.push(row);
        }
        txn.commit().await?;

        for row in &orders {
            self.event_sender
                .send_or_log(Event::OrderCreated(row.id))
                .await;
        }
        self.event_sender
            .send_or_log(Event::CheckoutStarted {
                gateway_order_id: gateway_order.id.clone(),
                order_count: orders.len(),
                total_amount,
            })
            .await;

        info!(
            "cart checkout started: {} orders under gateway order {}",
            orders.len(),
            gateway_order.id
        );

        Ok(CheckoutContext {
            razorpay_order_id: gateway_order.id,
            amount: total_amount * 100,
            total_amount,
            currency: self.config.default_currency.clone(),
            razorpay_key_id: self.config.razorpay_key_id.clone(),
            orders,
        })
    }

    async fn create_gateway_order(
        &self,
        total_amount: i64,
    ) -> Result<crate::services::razorpay::GatewayOrder, ServiceError> {
        self.gateway
            .create_order(total_amount * 100, &self.config.default_currency)
            .await
            .map_err(|e| {
                error!("gateway order creation failed: {}", e);
                ServiceError::ExternalServiceError(format!(
                    "payment gateway order creation failed: {}",
                    e
                ))
            })
    }
}
