mod common;

use common::TestApp;
use sareeshop_api::{errors::ServiceError, services::addresses::AddressInput};

fn address_input(label: &str, is_default: bool) -> AddressInput {
    AddressInput {
        label: label.to_string(),
        full_name: "Lakshmi Priya".to_string(),
        phone: "+919876543210".to_string(),
        address_line_1: "12 Temple Street".to_string(),
        address_line_2: None,
        city: "Kanchipuram".to_string(),
        state: "Tamil Nadu".to_string(),
        pincode: "631501".to_string(),
        is_default,
    }
}

#[tokio::test]
async fn adding_a_saree_twice_reports_already_in_cart() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let saree = app.create_saree("Mysore Silk", 1500).await;

    let first = app
        .state
        .services
        .cart
        .add_item(user.id, saree.id)
        .await
        .unwrap();
    assert!(first.added);
    assert!(!first.already_in_cart);
    assert_eq!(first.total_items, 1);

    let second = app
        .state
        .services
        .cart
        .add_item(user.id, saree.id)
        .await
        .unwrap();
    assert!(!second.added);
    assert!(second.already_in_cart);
    // Still a single line: one unit per distinct saree.
    assert_eq!(second.total_items, 1);
}

#[tokio::test]
async fn cart_totals_are_the_sum_of_line_prices() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let mysore = app.create_saree("Mysore Silk", 1500).await;
    let kanjivaram = app.create_saree("Kanjivaram Silk", 2200).await;

    app.state.services.cart.add_item(user.id, mysore.id).await.unwrap();
    app.state
        .services
        .cart
        .add_item(user.id, kanjivaram.id)
        .await
        .unwrap();

    let view = app.state.services.cart.view_cart(user.id).await.unwrap();
    assert_eq!(view.total_items, 2);
    assert_eq!(view.total_price, 3700);
    assert!(view.lines.iter().all(|line| line.item.quantity == 1));
}

#[tokio::test]
async fn removing_a_line_requires_ownership() {
    let app = TestApp::new().await;
    let owner = app.create_user("asha").await;
    let intruder = app.create_user("banu").await;
    let saree = app.create_saree("Mysore Silk", 1500).await;

    app.state.services.cart.add_item(owner.id, saree.id).await.unwrap();
    let view = app.state.services.cart.view_cart(owner.id).await.unwrap();
    let item_id = view.lines[0].item.id;

    let result = app
        .state
        .services
        .cart
        .remove_item(intruder.id, item_id)
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    // Owner removal works and names the saree.
    let name = app
        .state
        .services
        .cart
        .remove_item(owner.id, item_id)
        .await
        .unwrap();
    assert_eq!(name, "Mysore Silk");
    let view = app.state.services.cart.view_cart(owner.id).await.unwrap();
    assert_eq!(view.total_items, 0);
}

#[tokio::test]
async fn unavailable_sarees_cannot_be_added() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;
    let saree = app.create_saree("Mysore Silk", 1500).await;

    use sareeshop_api::entities::saree;
    use sea_orm::{ActiveModelTrait, Set};
    let mut active: saree::ActiveModel = saree.clone().into();
    active.available = Set(false);
    active.update(&*app.state.db).await.unwrap();

    let result = app.state.services.cart.add_item(user.id, saree.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn setting_a_new_default_address_unsets_the_previous_one() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;

    let first = app
        .state
        .services
        .addresses
        .create(user.id, address_input("Home", true))
        .await
        .unwrap();
    assert!(first.is_default);

    let second = app
        .state
        .services
        .addresses
        .create(user.id, address_input("Office", true))
        .await
        .unwrap();
    assert!(second.is_default);

    let listed = app.state.services.addresses.list(user.id).await.unwrap();
    let defaults: Vec<_> = listed.iter().filter(|a| a.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, second.id);
    // Default sorts first.
    assert_eq!(listed[0].id, second.id);
}

#[tokio::test]
async fn default_unset_is_scoped_to_the_owning_user() {
    let app = TestApp::new().await;
    let asha = app.create_user("asha").await;
    let banu = app.create_user("banu").await;

    app.state
        .services
        .addresses
        .create(asha.id, address_input("Home", true))
        .await
        .unwrap();
    app.state
        .services
        .addresses
        .create(banu.id, address_input("Home", true))
        .await
        .unwrap();

    let asha_addresses = app.state.services.addresses.list(asha.id).await.unwrap();
    assert!(asha_addresses.iter().any(|a| a.is_default));
}

#[tokio::test]
async fn address_update_and_delete_check_ownership() {
    let app = TestApp::new().await;
    let owner = app.create_user("asha").await;
    let intruder = app.create_user("banu").await;

    let address = app
        .state
        .services
        .addresses
        .create(owner.id, address_input("Home", false))
        .await
        .unwrap();

    let update = app
        .state
        .services
        .addresses
        .update(intruder.id, address.id, address_input("Hijack", false))
        .await;
    assert!(matches!(update, Err(ServiceError::NotFound(_))));

    let delete = app.state.services.addresses.delete(intruder.id, address.id).await;
    assert!(matches!(delete, Err(ServiceError::NotFound(_))));

    app.state
        .services
        .addresses
        .delete(owner.id, address.id)
        .await
        .unwrap();
    assert!(app
        .state
        .services
        .addresses
        .list(owner.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn address_validation_rejects_blank_required_fields() {
    let app = TestApp::new().await;
    let user = app.create_user("asha").await;

    let mut input = address_input("Home", false);
    input.city = String::new();

    let result = app.state.services.addresses.create(user.id, input).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}
