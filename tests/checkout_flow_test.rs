mod common;

use common::{fake_signature, TestApp};
use sareeshop_api::{errors::ServiceError, services::settlement::PaymentCallback};
use uuid::Uuid;

#[tokio::test]
async fn buy_now_creates_one_pending_order_under_a_fresh_gateway_order() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let address = app.create_address(user.id, true).await;
    let saree = app.create_saree("Mysore Silk", 1500).await;

    let ctx = app
        .state
        .services
        .checkout
        .buy_now(user.id, saree.id, address.id)
        .await
        .expect("buy-now should succeed");

    assert_eq!(ctx.orders.len(), 1);
    assert_eq!(ctx.total_amount, 1500);
    // Gateway receives paise.
    assert_eq!(ctx.amount, 150_000);
    assert_eq!(ctx.currency, "INR");

    let order = &ctx.orders[0];
    assert!(!order.is_paid());
    assert_eq!(order.razorpay_order_id, ctx.razorpay_order_id);
    assert_eq!(order.delivery_address_id, Some(address.id));

    let created = app.gateway.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 150_000);
}

#[tokio::test]
async fn cart_checkout_creates_one_order_per_line_sharing_the_gateway_order() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let address = app.create_address(user.id, true).await;
    let mysore = app.create_saree("Mysore Silk", 1500).await;
    let kanjivaram = app.create_saree("Kanjivaram Silk", 2200).await;
    app.create_cart_with_item(user.id, mysore.id).await;
    app.state
        .services
        .cart
        .add_item(user.id, kanjivaram.id)
        .await
        .unwrap();

    let ctx = app
        .state
        .services
        .checkout
        .checkout_cart(user.id, address.id)
        .await
        .expect("cart checkout should succeed");

    assert_eq!(ctx.orders.len(), 2);
    assert_eq!(ctx.total_amount, 3700);
    assert_eq!(ctx.amount, 370_000);
    assert!(ctx
        .orders
        .iter()
        .all(|o| o.razorpay_order_id == ctx.razorpay_order_id));

    // Per-line amounts, not the group total.
    let mut amounts: Vec<i64> = ctx.orders.iter().map(|o| o.amount).collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![1500, 2200]);
}

#[tokio::test]
async fn cart_checkout_rejects_an_empty_cart() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let address = app.create_address(user.id, true).await;
    // Cart exists but holds nothing.
    app.state
        .services
        .cart
        .get_or_create_cart(user.id)
        .await
        .unwrap();

    let result = app
        .state
        .services
        .checkout
        .checkout_cart(user.id, address.id)
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
    assert!(app.gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_requires_an_address_owned_by_the_caller() {
    let app = TestApp::new().await;
    let buyer = app.create_user("asha").await;
    let other = app.create_user("banu").await;
    let foreign_address = app.create_address(other.id, true).await;
    let saree = app.create_saree("Mysore Silk", 1500).await;

    let result = app
        .state
        .services
        .checkout
        .buy_now(buyer.id, saree.id, foreign_address.id)
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn buy_now_rejects_unknown_sarees() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let address = app.create_address(user.id, true).await;

    let result = app
        .state
        .services
        .checkout
        .buy_now(user.id, Uuid::new_v4(), address.id)
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert!(app.gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_then_settlement_round_trip() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let address = app.create_address(user.id, true).await;
    let mysore = app.create_saree("Mysore Silk", 1500).await;
    let kanjivaram = app.create_saree("Kanjivaram Silk", 2200).await;
    app.create_cart_with_item(user.id, mysore.id).await;
    app.state
        .services
        .cart
        .add_item(user.id, kanjivaram.id)
        .await
        .unwrap();

    let ctx = app
        .state
        .services
        .checkout
        .checkout_cart(user.id, address.id)
        .await
        .unwrap();

    let outcome = app
        .state
        .services
        .settlement
        .settle(
            PaymentCallback {
                razorpay_order_id: ctx.razorpay_order_id.clone(),
                razorpay_payment_id: "pay_round_trip".into(),
                razorpay_signature: fake_signature(&ctx.razorpay_order_id, "pay_round_trip"),
            },
            Some(user.id),
        )
        .await
        .expect("settlement should succeed");

    assert_eq!(outcome.orders.len(), 2);
    assert_eq!(outcome.total_amount, 3700);
    assert!(outcome.orders.iter().all(|o| o.is_paid()));

    // Checkout consumed the cart.
    let view = app.state.services.cart.view_cart(user.id).await.unwrap();
    assert_eq!(view.total_items, 0);
}
