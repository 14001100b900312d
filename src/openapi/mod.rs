//! OpenAPI document and Swagger UI wiring.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sareeshop API",
        description = "Online saree storefront: catalog, cart, address book, checkout, Razorpay settlement, and order notifications"
    ),
    paths(
        crate::handlers::catalog::list_sarees,
        crate::handlers::catalog::get_saree,
        crate::handlers::catalog::get_saree_images,
        crate::handlers::cart::view_cart,
        crate::handlers::cart::add_to_cart,
        crate::handlers::cart::remove_from_cart,
        crate::handlers::cart::clear_cart,
        crate::handlers::addresses::list_addresses,
        crate::handlers::addresses::create_address,
        crate::handlers::addresses::update_address,
        crate::handlers::addresses::delete_address,
        crate::handlers::checkout::buy_now,
        crate::handlers::checkout::checkout_cart,
        crate::handlers::payments::payment_complete,
        crate::handlers::payments::payment_complete_redirect,
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::profile,
        crate::handlers::health::live,
        crate::handlers::health::ready,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::catalog::SareeResponse,
        crate::handlers::cart::CartLineResponse,
        crate::handlers::cart::CartViewResponse,
        crate::handlers::cart::AddToCartResponse,
        crate::handlers::addresses::AddressResponse,
        crate::services::addresses::AddressInput,
        crate::handlers::checkout::OrderResponse,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::checkout::StartCheckoutRequest,
        crate::handlers::payments::SettlementResponse,
        crate::services::settlement::PaymentCallback,
        crate::auth::SignupInput,
        crate::auth::LoginInput,
        crate::handlers::auth::UserResponse,
        crate::handlers::auth::AuthResponse,
        crate::handlers::auth::ProfileResponse,
        crate::handlers::health::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Catalog", description = "Saree catalog browsing"),
        (name = "Cart", description = "Shopping cart management"),
        (name = "Addresses", description = "Delivery address book"),
        (name = "Checkout", description = "Checkout initiation"),
        (name = "Payments", description = "Payment settlement"),
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Health", description = "Probes"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
