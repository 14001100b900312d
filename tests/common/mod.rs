//! Shared test harness: in-memory SQLite application state with recording
//! fakes injected for the payment gateway, email, and SMS collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sareeshop_api::{
    config::AppConfig,
    db,
    entities::{address, cart, cart_item, order, saree, user, PaymentState},
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        email::{EmailDispatcher, EmailError},
        razorpay::{GatewayError, GatewayOrder, PaymentDetails, PaymentGateway},
        sms::SmsDispatcher,
    },
    AppState,
};
use axum::Router;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// The signature the fake gateway accepts for a given (order, payment) pair.
pub fn fake_signature(order_id: &str, payment_id: &str) -> String {
    format!("{}|{}|signed", order_id, payment_id)
}

/// Deterministic gateway fake: accepts only `fake_signature` values and
/// allocates sequential gateway order ids.
pub struct FakeGateway {
    pub created: Mutex<Vec<GatewayOrder>>,
    pub fetch_fails: AtomicBool,
    pub payment_details: Mutex<Option<PaymentDetails>>,
    counter: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            created: Mutex::new(Vec::new()),
            fetch_fails: AtomicBool::new(false),
            payment_details: Mutex::new(None),
            counter: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let order = GatewayOrder {
            id: format!("order_test{:03}", n),
            amount: amount_minor,
            currency: currency.to_string(),
        };
        self.created.lock().unwrap().push(order.clone());
        Ok(order)
    }

    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        if signature == fake_signature(order_id, payment_id) {
            Ok(())
        } else {
            Err(GatewayError::SignatureMismatch)
        }
    }

    async fn fetch_payment(&self, _payment_id: &str) -> Result<PaymentDetails, GatewayError> {
        if self.fetch_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("gateway unreachable".into()));
        }
        Ok(self
            .payment_details
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
}

/// Email fake that records every send, optionally failing all of them.
pub struct RecordingEmail {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail: AtomicBool,
}

impl RecordingEmail {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailDispatcher for RecordingEmail {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError::Smtp("connection refused".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            subject: subject.to_string(),
            body: body.to_string(),
            to: to.to_vec(),
        });
        Ok(())
    }
}

/// SMS fake that records every send, optionally reporting failure.
pub struct RecordingSms {
    pub sent: Mutex<Vec<(String, String)>>,
    pub succeed: AtomicBool,
}

impl RecordingSms {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            succeed: AtomicBool::new(true),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsDispatcher for RecordingSms {
    async fn send(&self, to_phone: &str, message: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to_phone.to_string(), message.to_string()));
        self.succeed.load(Ordering::SeqCst)
    }
}

/// Application state over a fresh in-memory database plus handles to the
/// injected fakes.
pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub email: Arc<RecordingEmail>,
    pub sms: Arc<RecordingSms>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application, letting the caller adjust configuration
    /// before services are wired.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single pooled connection keeps every query on the same
        // in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.admin_email = Some("admin@example.com".to_string());
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = FakeGateway::new();
        let email = RecordingEmail::new();
        let sms = RecordingSms::new();

        let config = Arc::new(cfg);
        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            config.clone(),
            gateway.clone(),
            email.clone(),
            sms.clone(),
        );

        let state = AppState {
            db: db_arc,
            config,
            event_sender,
            services,
        };

        Self {
            state,
            gateway,
            email,
            sms,
            _event_task: event_task,
        }
    }

    /// Full HTTP router over this application state.
    pub fn router(&self) -> Router {
        Router::new()
            .nest("/api/v1", sareeshop_api::api_v1_routes())
            .merge(sareeshop_api::health_routes())
            .with_state(self.state.clone())
    }

    pub async fn create_user(&self, username: &str) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(format!("{}@example.com", username)),
            password_hash: Set("unused-in-fixture".to_string()),
            full_name: Set(format!("{} Test", username)),
            mobile_number: Set(Some("+919876500000".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create test user")
    }

    pub async fn create_address(&self, user_id: Uuid, is_default: bool) -> address::Model {
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            label: Set("Home".to_string()),
            full_name: Set("Lakshmi Priya".to_string()),
            phone: Set("+919876543210".to_string()),
            address_line_1: Set("12 Temple Street".to_string()),
            address_line_2: Set(None),
            city: Set("Kanchipuram".to_string()),
            state: Set("Tamil Nadu".to_string()),
            pincode: Set("631501".to_string()),
            is_default: Set(is_default),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create test address")
    }

    pub async fn create_saree(&self, name: &str, price: i64) -> saree::Model {
        saree::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            price: Set(price),
            description: Set(String::new()),
            main_image: Set(Some(format!(
                "sarees/{}.jpg",
                name.to_lowercase().replace(' ', "-")
            ))),
            extra_image_1: Set(None),
            extra_image_2: Set(None),
            extra_image_3: Set(None),
            available: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create test saree")
    }

    pub async fn create_cart_with_item(&self, user_id: Uuid, saree_id: Uuid) -> cart::Model {
        let cart = self
            .state
            .services
            .cart
            .get_or_create_cart(user_id)
            .await
            .expect("failed to create cart");
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            saree_id: Set(saree_id),
            quantity: Set(1),
            added_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create cart item");
        cart
    }

    /// Pending order row sharing `gateway_order_id` with its checkout group.
    pub async fn create_order_row(
        &self,
        saree_id: Uuid,
        user_id: Option<Uuid>,
        address_id: Option<Uuid>,
        gateway_order_id: &str,
        amount: i64,
    ) -> order::Model {
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            saree_id: Set(saree_id),
            user_id: Set(user_id),
            quantity: Set(1),
            delivery_address_id: Set(address_id),
            guest_name: Set(None),
            guest_email: Set(None),
            guest_phone: Set(None),
            guest_address: Set(None),
            razorpay_order_id: Set(gateway_order_id.to_string()),
            razorpay_payment_id: Set(None),
            razorpay_signature: Set(None),
            payment_state: Set(PaymentState::Pending),
            amount: Set(amount),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to create test order")
    }
}
