//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready       - Liveness, readiness (see `crate::app`)
//! GET  /api/status                  - Backend name and document counts
//! GET  /api/events                  - Sync events (SSE)
//!
//! # Auth (JSON)
//! POST /auth/register, /auth/login, /auth/logout
//! GET  /auth/me
//!
//! # Applications
//! POST /api/applications                        - Merchant submits
//! GET  /api/applications/mine                   - Merchant's latest application
//! GET  /api/admin/applications?status=          - Admin list
//! GET  /api/admin/applications/stats
//! GET  /api/admin/applications/{id}
//! POST /api/admin/applications/{id}/approve
//! POST /api/admin/applications/{id}/reject      - {reason}
//! GET  /api/admin/stores
//!
//! # Merchant dashboard (the merchant's own store)
//! GET/PUT         /api/merchant/store
//! GET/POST        /api/merchant/products
//! GET/PUT/DELETE  /api/merchant/products/{id}
//! GET/POST        /api/merchant/categories
//! GET/POST        /api/merchant/customers
//! PUT             /api/merchant/customers/{id}
//! GET             /api/merchant/orders
//! PUT             /api/merchant/orders/{id}/status
//!
//! # Storefront
//! GET  /store/{key}                 - HTML
//! GET  /api/store/{key}             - JSON
//! GET  /api/store/{key}/cart
//! POST /api/store/{key}/cart/add, /cart/update, /cart/remove
//! POST /api/store/{key}/checkout
//! ```

pub mod admin;
pub mod applications;
pub mod auth;
pub mod cart;
pub mod events;
pub mod health;
pub mod merchant;
pub mod storefront;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the admin API routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(admin::list_applications))
        .route("/applications/stats", get(admin::application_stats))
        .route("/applications/{id}", get(admin::show_application))
        .route("/applications/{id}/approve", post(admin::approve_application))
        .route("/applications/{id}/reject", post(admin::reject_application))
        .route("/stores", get(admin::list_stores))
}

/// Create the merchant dashboard routes router.
pub fn merchant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/store",
            get(merchant::show_store).put(merchant::update_store),
        )
        .route(
            "/products",
            get(merchant::list_products).post(merchant::create_product),
        )
        .route(
            "/products/{id}",
            get(merchant::show_product)
                .put(merchant::update_product)
                .delete(merchant::delete_product),
        )
        .route(
            "/categories",
            get(merchant::list_categories).post(merchant::create_category),
        )
        .route(
            "/customers",
            get(merchant::list_customers).post(merchant::create_customer),
        )
        .route("/customers/{id}", put(merchant::update_customer))
        .route("/orders", get(merchant::list_orders))
        .route("/orders/{id}/status", put(merchant::update_order_status))
}

/// Create the storefront JSON routes router.
pub fn storefront_api_routes() -> Router<AppState> {
    Router::new()
        .route("/{key}", get(storefront::show_json))
        .route("/{key}/cart", get(cart::show))
        .route("/{key}/cart/add", post(cart::add))
        .route("/{key}/cart/update", post(cart::update))
        .route("/{key}/cart/remove", post(cart::remove))
        .route("/{key}/checkout", post(cart::checkout))
}

/// Create all routes for the platform.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(health::status))
        .route("/api/events", get(events::stream))
        .nest("/auth", auth_routes())
        .route("/api/applications", post(applications::submit))
        .route("/api/applications/mine", get(applications::mine))
        .nest("/api/admin", admin_routes())
        .nest("/api/merchant", merchant_routes())
        .route("/store/{key}", get(storefront::show_html))
        .nest("/api/store", storefront_api_routes())
}
