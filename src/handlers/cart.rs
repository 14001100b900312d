use crate::{auth::CurrentUser, errors::ServiceError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::SareeResponse;

/// One cart line with its saree.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub item_id: Uuid,
    pub quantity: i32,
    pub saree: SareeResponse,
}

/// The caller's cart with derived totals.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartViewResponse {
    pub cart_id: Uuid,
    pub lines: Vec<CartLineResponse>,
    /// Whole rupees.
    pub total_price: i64,
    pub total_items: usize,
}

/// Outcome of an add-to-cart request.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddToCartResponse {
    pub success: bool,
    pub already_in_cart: bool,
    pub message: String,
    pub cart_total_items: usize,
}

/// View the caller's cart
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart contents", body = CartViewResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<CartViewResponse>, ServiceError> {
    let view = state.services.cart.view_cart(user.id).await?;

    Ok(Json(CartViewResponse {
        cart_id: view.cart.id,
        total_price: view.total_price,
        total_items: view.total_items,
        lines: view
            .lines
            .into_iter()
            .map(|line| CartLineResponse {
                item_id: line.item.id,
                quantity: line.item.quantity,
                saree: SareeResponse::from(line.saree),
            })
            .collect(),
    }))
}

/// Add a saree to the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Saree to add")),
    responses(
        (status = 200, description = "Add outcome; duplicate adds are reported, not errors", body = AddToCartResponse),
        (status = 404, description = "Unknown or unavailable saree", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(saree_id): Path<Uuid>,
) -> Result<Json<AddToCartResponse>, ServiceError> {
    let outcome = state.services.cart.add_item(user.id, saree_id).await?;

    let message = if outcome.already_in_cart {
        format!("{} is already in your cart!", outcome.saree_name)
    } else {
        format!("{} added to cart!", outcome.saree_name)
    };

    Ok(Json(AddToCartResponse {
        success: outcome.added,
        already_in_cart: outcome.already_in_cart,
        message,
        cart_total_items: outcome.total_items,
    }))
}

/// Remove a line from the caller's cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart line to remove")),
    responses(
        (status = 200, description = "Line removed"),
        (status = 404, description = "Line not in the caller's cart", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let saree_name = state.services.cart.remove_item(user.id, item_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("{} removed from cart!", saree_name),
    })))
}

/// Remove every line from the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/clear",
    responses((status = 204, description = "Cart emptied")),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, ServiceError> {
    state.services.cart.clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
