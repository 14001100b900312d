use crate::{
    auth::CurrentUser,
    entities::{order, PaymentState},
    errors::ServiceError,
    services::checkout::CheckoutContext,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order row as rendered to the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    /// Short human-facing reference.
    pub reference: String,
    pub saree_id: Uuid,
    pub quantity: i32,
    /// Whole rupees.
    pub amount: i64,
    pub payment_state: String,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            reference: model.reference(),
            id: model.id,
            saree_id: model.saree_id,
            quantity: model.quantity,
            amount: model.amount,
            payment_state: match model.payment_state {
                PaymentState::Pending => "pending".to_string(),
                PaymentState::Paid => "paid".to_string(),
            },
            razorpay_order_id: model.razorpay_order_id,
            razorpay_payment_id: model.razorpay_payment_id,
            created_at: model.created_at,
        }
    }
}

/// Payload the payment page needs to open the gateway checkout widget.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub razorpay_order_id: String,
    /// Paise, as handed to the gateway.
    pub amount: i64,
    /// Whole rupees.
    pub total_amount: i64,
    pub currency: String,
    pub razorpay_key_id: String,
    pub orders: Vec<OrderResponse>,
}

impl From<CheckoutContext> for CheckoutResponse {
    fn from(ctx: CheckoutContext) -> Self {
        Self {
            razorpay_order_id: ctx.razorpay_order_id,
            amount: ctx.amount,
            total_amount: ctx.total_amount,
            currency: ctx.currency,
            razorpay_key_id: ctx.razorpay_key_id,
            orders: ctx.orders.into_iter().map(OrderResponse::from).collect(),
        }
    }
}

/// Delivery address selection for a checkout.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartCheckoutRequest {
    pub address_id: Uuid,
}

/// Start a buy-now checkout for a single saree
#[utoipa::path(
    post,
    path = "/api/v1/checkout/buy-now/{saree_id}",
    params(("saree_id" = Uuid, Path, description = "Saree to buy")),
    request_body = StartCheckoutRequest,
    responses(
        (status = 201, description = "Pending order created under a fresh gateway order", body = CheckoutResponse),
        (status = 404, description = "Unknown saree or address", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway order creation failed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn buy_now(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(saree_id): Path<Uuid>,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ServiceError> {
    let ctx = state
        .services
        .checkout
        .buy_now(user.id, saree_id, payload.address_id)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(ctx))))
}

/// Start a checkout over the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/checkout/cart",
    request_body = StartCheckoutRequest,
    responses(
        (status = 201, description = "One pending order per cart line, sharing a gateway order", body = CheckoutResponse),
        (status = 400, description = "Empty cart", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown address", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway order creation failed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn checkout_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ServiceError> {
    let ctx = state
        .services
        .checkout
        .checkout_cart(user.id, payload.address_id)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(ctx))))
}
