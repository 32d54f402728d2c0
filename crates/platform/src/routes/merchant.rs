//! Merchant dashboard: the logged-in merchant's store, catalog, customers
//! and orders.
//!
//! Every handler is scoped to the store the merchant owns; ids belonging to
//! another store answer 404.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bazaar_core::{CustomerId, OrderId, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::RequireMerchant;
use crate::models::{
    Category, CurrentUser, Customer, CustomerPatch, NewCategory, NewCustomer, NewProduct, Order,
    OrderStatusUpdate, Product, ProductPatch, Store, StorePatch,
};
use crate::state::AppState;

/// The store owned by `merchant`.
async fn merchant_store(state: &AppState, merchant: &CurrentUser) -> Result<Store> {
    state
        .stores()
        .get_store_by_owner(&merchant.id)
        .await?
        .ok_or_else(|| AppError::NotFound("store for this merchant".to_string()))
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(what.to_string())
}

// =============================================================================
// Store
// =============================================================================

/// GET /api/merchant/store
pub async fn show_store(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<Json<Store>> {
    Ok(Json(merchant_store(&state, &merchant).await?))
}

/// Update name, branding, customization or settings.
///
/// PUT /api/merchant/store
#[instrument(skip_all, fields(merchant_id = %merchant.id))]
pub async fn update_store(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Json(patch): Json<StorePatch>,
) -> Result<Json<Store>> {
    let store = merchant_store(&state, &merchant).await?;
    state
        .stores()
        .update_store(&store.id, patch, &merchant)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("store"))
}

// =============================================================================
// Products
// =============================================================================

/// GET /api/merchant/products
pub async fn list_products(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<Json<Vec<Product>>> {
    let store = merchant_store(&state, &merchant).await?;
    Ok(Json(state.catalog().list_products(Some(&store.id)).await?))
}

/// POST /api/merchant/products
pub async fn create_product(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let store = merchant_store(&state, &merchant).await?;
    let product = state.catalog().create_product(&store.id, new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/merchant/products/{id}
pub async fn show_product(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let store = merchant_store(&state, &merchant).await?;
    state
        .catalog()
        .get_product(&id)
        .await?
        .filter(|p| p.store_id == store.id)
        .map(Json)
        .ok_or_else(|| not_found("product"))
}

/// PUT /api/merchant/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let store = merchant_store(&state, &merchant).await?;
    state
        .catalog()
        .update_product(&store.id, &id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("product"))
}

/// DELETE /api/merchant/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let store = merchant_store(&state, &merchant).await?;
    if state.catalog().delete_product(&store.id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("product"))
    }
}

// =============================================================================
// Categories
// =============================================================================

/// GET /api/merchant/categories
pub async fn list_categories(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<Json<Vec<Category>>> {
    let store = merchant_store(&state, &merchant).await?;
    Ok(Json(state.catalog().list_categories(Some(&store.id)).await?))
}

/// POST /api/merchant/categories
pub async fn create_category(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let store = merchant_store(&state, &merchant).await?;
    let category = state.catalog().create_category(&store.id, new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// =============================================================================
// Customers
// =============================================================================

/// GET /api/merchant/customers
pub async fn list_customers(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<Json<Vec<Customer>>> {
    let store = merchant_store(&state, &merchant).await?;
    Ok(Json(state.catalog().list_customers(Some(&store.id)).await?))
}

/// POST /api/merchant/customers
pub async fn create_customer(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Json(new): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>)> {
    let store = merchant_store(&state, &merchant).await?;
    let customer = state.catalog().create_customer(&store.id, new).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /api/merchant/customers/{id}
pub async fn update_customer(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<CustomerId>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>> {
    let store = merchant_store(&state, &merchant).await?;
    state
        .catalog()
        .update_customer(&store.id, &id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("customer"))
}

// =============================================================================
// Orders
// =============================================================================

/// GET /api/merchant/orders
pub async fn list_orders(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<Json<Vec<Order>>> {
    let store = merchant_store(&state, &merchant).await?;
    Ok(Json(state.orders().list_orders(Some(&store.id)).await?))
}

/// PUT /api/merchant/orders/{id}/status
#[instrument(skip_all, fields(order_id = %id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<OrderId>,
    Json(update): Json<OrderStatusUpdate>,
) -> Result<Json<Order>> {
    let store = merchant_store(&state, &merchant).await?;
    state
        .orders()
        .update_order_status(&store.id, &id, update)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("order"))
}
