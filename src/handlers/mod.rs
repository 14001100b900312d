//! HTTP handlers and the aggregated service bundle behind them.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod payments;

use crate::{
    auth::AuthService,
    config::AppConfig,
    events::EventSender,
    services::{
        email::EmailDispatcher, razorpay::PaymentGateway, sms::SmsDispatcher, AddressService,
        CartService, CatalogService, CheckoutService, NotificationService, OrderService,
        SettlementService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// All services used by HTTP handlers, wired once at startup from the
/// injected external collaborators.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub addresses: Arc<AddressService>,
    pub orders: Arc<OrderService>,
    pub checkout: Arc<CheckoutService>,
    pub settlement: Arc<SettlementService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
        gateway: Arc<dyn PaymentGateway>,
        email: Arc<dyn EmailDispatcher>,
        sms: Arc<dyn SmsDispatcher>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            db.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration,
        ));
        let catalog = Arc::new(CatalogService::new(db.clone()));
        let cart = Arc::new(CartService::new(db.clone(), event_sender.clone()));
        let addresses = Arc::new(AddressService::new(db.clone(), event_sender.clone()));
        let orders = Arc::new(OrderService::new(db.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            event_sender.clone(),
            gateway.clone(),
            addresses.clone(),
            config.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(email, sms, config.clone()));
        let settlement = Arc::new(SettlementService::new(
            db,
            event_sender,
            gateway,
            notifications,
            config.replay_policy(),
        ));

        Self {
            auth,
            catalog,
            cart,
            addresses,
            orders,
            checkout,
            settlement,
        }
    }
}
