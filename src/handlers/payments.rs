use crate::{
    auth::CurrentUser, errors::ServiceError, services::settlement::PaymentCallback, AppState,
};
use axum::{
    extract::State,
    response::Redirect,
    Form, Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use super::checkout::OrderResponse;

/// The one message every settlement failure renders. The caller learns
/// nothing about which step failed; diagnostics go to logs only.
const GENERIC_FAILURE: &str = "Payment could not be verified";

/// Success payload listing the settled order group.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettlementResponse {
    pub orders: Vec<OrderResponse>,
    /// Whole rupees.
    pub total_amount: i64,
    /// True when this callback re-settled an already-paid group.
    pub replayed: bool,
}

/// Gateway payment callback: verifies the payment, marks the order group
/// paid, fans out notifications, and consumes the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/payments/complete",
    request_body(content = PaymentCallback, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Order group settled", body = SettlementResponse),
        (status = 402, description = "Settlement failed; reason is not disclosed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn payment_complete(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(callback): Form<PaymentCallback>,
) -> Result<Json<SettlementResponse>, ServiceError> {
    match state
        .services
        .settlement
        .settle(callback, Some(user.id))
        .await
    {
        Ok(outcome) => Ok(Json(SettlementResponse {
            orders: outcome
                .orders
                .into_iter()
                .map(OrderResponse::from)
                .collect(),
            total_amount: outcome.total_amount,
            replayed: outcome.replayed,
        })),
        // Unknown order, verification failure, and persistence failure all
        // render identically.
        Err(err) => {
            error!("settlement failed: {}", err);
            Err(ServiceError::PaymentFailed(GENERIC_FAILURE.to_string()))
        }
    }
}

/// Non-submission requests are redirected back to the shop with no side
/// effect.
#[utoipa::path(
    get,
    path = "/api/v1/payments/complete",
    responses((status = 303, description = "Redirected to the catalog")),
    tag = "Payments"
)]
pub async fn payment_complete_redirect() -> Redirect {
    Redirect::to("/api/v1/sarees")
}
