//! Sareeshop API Library
//!
//! Backend for an online saree storefront. The core of the system is the
//! post-payment settlement workflow in `services::settlement`; everything
//! else is thin persistence and form handling around it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

/// Storefront API under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/sarees", get(handlers::catalog::list_sarees))
        .route("/sarees/:id", get(handlers::catalog::get_saree))
        .route("/sarees/:id/images", get(handlers::catalog::get_saree_images))
        // Cart
        .route("/cart", get(handlers::cart::view_cart))
        .route(
            "/cart/items/:id",
            post(handlers::cart::add_to_cart).delete(handlers::cart::remove_from_cart),
        )
        .route("/cart/clear", post(handlers::cart::clear_cart))
        // Address book
        .route(
            "/addresses",
            get(handlers::addresses::list_addresses).post(handlers::addresses::create_address),
        )
        .route(
            "/addresses/:id",
            put(handlers::addresses::update_address)
                .delete(handlers::addresses::delete_address),
        )
        // Checkout
        .route("/checkout/buy-now/:saree_id", post(handlers::checkout::buy_now))
        .route("/checkout/cart", post(handlers::checkout::checkout_cart))
        // Settlement callback; non-submission requests are redirected away
        .route(
            "/payments/complete",
            post(handlers::payments::payment_complete)
                .get(handlers::payments::payment_complete_redirect),
        )
        // Accounts
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/profile", get(handlers::auth::profile))
}

/// Liveness and readiness probes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(handlers::health::live))
        .route("/health/ready", get(handlers::health::ready))
}
