//! Payment gateway client. The settlement and checkout services only see the
//! `PaymentGateway` trait; the Razorpay implementation is injected at startup.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Payment gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(String),
    #[error("payment signature mismatch")]
    SignatureMismatch,
    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Remote payment intent created at checkout initiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor currency units (paise).
    pub amount: i64,
    pub currency: String,
}

/// Payment metadata fetched after capture, used to enrich receipts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: Option<String>,
    pub status: Option<String>,
    /// Minor currency units (paise).
    pub amount: Option<i64>,
    /// Epoch seconds.
    pub created_at: Option<i64>,
}

/// Contract the checkout and settlement workflows depend on.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a remote payment intent and returns its gateway order id.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Verifies that (order id, payment id, signature) form a consistent
    /// triple signed by the gateway.
    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError>;

    /// Fetches payment metadata for receipts.
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentDetails, GatewayError>;
}

/// Razorpay REST client.
pub struct RazorpayClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    payment_capture: u8,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self::with_base_url(key_id, key_secret, RAZORPAY_API_BASE.to_string())
    }

    /// Base URL override, used to point the client at a stub server in tests.
    pub fn with_base_url(key_id: String, key_secret: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url,
            key_id,
            key_secret,
        }
    }

    /// HMAC-SHA256 over `"{order_id}|{payment_id}"` with the key secret,
    /// hex-encoded. This is the payload Razorpay signs on checkout success.
    fn expected_signature(&self, order_id: &str, payment_id: &str) -> String {
        let payload = format!("{}|{}", order_id, payment_id);
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    #[instrument(skip(self))]
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest {
                amount: amount_minor,
                currency,
                payment_capture: 1,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedResponse(format!(
                "order creation returned {}",
                response.status()
            )));
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))
    }

    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        let expected = self.expected_signature(order_id, payment_id);
        if constant_time_eq(&expected, signature) {
            Ok(())
        } else {
            Err(GatewayError::SignatureMismatch)
        }
    }

    #[instrument(skip(self))]
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentDetails, GatewayError> {
        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedResponse(format!(
                "payment fetch returned {}",
                response.status()
            )));
        }

        response
            .json::<PaymentDetails>()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
