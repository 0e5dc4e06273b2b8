//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home (featured products + promotions)
//! GET  /health                  - Health check
//!
//! # Catalog
//! GET  /search                  - Product search
//! GET  /product/{id}            - Product detail aggregation
//! GET  /product/{id}/reviews    - Review listing
//! POST /product/{id}/reviews    - Submit a review (requires auth)
//! POST /product/{id}/buy        - Buy now (requires auth)
//! GET  /promotions              - Promotion listing
//! GET  /promotions/{id}         - Promotion detail
//!
//! # Cart (requires auth except add's deferred path)
//! GET  /cart                    - Fetch cart, refresh session mirror
//! POST /cart/add                - Add item (defers to post-login when guest)
//! PUT  /cart                    - Update quantity (optimistic, pushed upstream)
//! POST /cart/remove             - Remove item (session mirror only)
//!
//! # Checkout & payment
//! POST /checkout                - Validate and branch (direct order | redirect)
//! GET  /payment-result          - Provider callback reconciliation
//! GET  /order-confirmation/{id} - Confirmation payload
//!
//! # Auth
//! POST /login                   - Login against the remote API
//! POST /register                - Register a customer account
//! POST /logout                  - Clear the session's auth
//!
//! # Account (requires auth)
//! GET  /profile                 - Profile
//! POST /profile/rename          - Change display name
//! POST /profile/change-password - Change password
//! GET  /addresses               - Address list (auto-selects first)
//! POST /addresses               - Upsert address
//! DELETE /addresses/{id}        - Delete address
//! POST /addresses/{id}/select   - Select address for checkout
//! GET  /orders                  - Order history
//! GET  /orders/{id}             - Order detail
//! POST /orders/{id}/cancel      - Request cancellation
//! GET  /reviews/permission      - Products awaiting review
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod payment_result;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_sessions::Session;

use crate::commerce::CommerceError;
use crate::error::AppError;
use crate::middleware::clear_customer_auth;
use crate::state::AppState;

/// Convert a commerce error into an app error, clearing the session's token
/// when the remote API says it is no longer valid.
pub(crate) async fn map_commerce_err(session: &Session, err: CommerceError) -> AppError {
    if matches!(err, CommerceError::AuthRequired) {
        if let Err(err) = clear_customer_auth(session).await {
            tracing::warn!("Failed to clear expired auth from session: {err}");
        }
    }
    err.into()
}

/// Map a commerce result into an app result via [`map_commerce_err`].
pub(crate) async fn commerce_result<T>(
    session: &Session,
    result: Result<T, CommerceError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => Err(map_commerce_err(session, err).await),
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).put(cart::update))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(products::search))
        .route("/product/{id}", get(products::show))
        .route(
            "/product/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
        .route("/product/{id}/buy", post(checkout::buy_now))
        .route("/promotions", get(products::promotions))
        .route("/promotions/{id}", get(products::promotion))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(account::profile))
        .route("/profile/rename", post(account::rename))
        .route("/profile/change-password", post(account::change_password))
        .route(
            "/addresses",
            get(account::addresses).post(account::upsert_address),
        )
        .route("/addresses/{id}", delete(account::delete_address))
        .route("/addresses/{id}/select", post(account::select_address))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .route("/reviews/permission", get(account::review_permissions))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(products::home))
        // Catalog routes
        .merge(catalog_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout & payment
        .route("/checkout", post(checkout::checkout))
        .route("/payment-result", get(payment_result::show))
        .route(
            "/order-confirmation/{id}",
            get(checkout::order_confirmation),
        )
        // Account routes
        .merge(account_routes())
        // Auth routes
        .merge(auth_routes())
}
