//! Cart and checkout handlers.
//!
//! Carts live in the session, one per store (see [`cart_key`]), and are
//! priced against the current catalog on every read.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use bazaar_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::{Cart, Order, Product, Store, cart_key};
use crate::services::orders::{CheckoutRequest, Quote};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    /// Shipping city, for zone pricing.
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_cart(session: &Session, store: &Store) -> Result<Cart> {
    Ok(session
        .get::<Cart>(&cart_key(&store.id))
        .await?
        .unwrap_or_default())
}

async fn save_cart(session: &Session, store: &Store, cart: &Cart) -> Result<()> {
    let key = cart_key(&store.id);
    if cart.is_empty() {
        session.remove::<Cart>(&key).await?;
    } else {
        session.insert(&key, cart).await?;
    }
    Ok(())
}

/// The store behind a storefront key. Carts never use preview mode.
async fn cart_store(state: &AppState, key: &str) -> Result<Store> {
    state
        .storefront()
        .resolve_store(key, None, None)
        .await?
        .map(|resolved| resolved.store)
        .ok_or_else(|| AppError::NotFound(format!("store '{key}'")))
}

/// A cart line may not ask for more than the product has in stock.
fn check_stock(cart: &Cart, product: &Product) -> Result<()> {
    if cart.quantity_of(&product.id) > product.stock {
        return Err(AppError::Conflict(format!(
            "only {} of {} left in stock",
            product.stock, product.name
        )));
    }
    Ok(())
}

async fn quote(state: &AppState, store: &Store, cart: &Cart, city: Option<&str>) -> Result<Quote> {
    Ok(state.orders().quote_cart(store, cart, city).await?)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/store/{key}/cart
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Query(query): Query<CartQuery>,
) -> Result<Json<Quote>> {
    let store = cart_store(&state, &key).await?;
    let cart = load_cart(&session, &store).await?;
    Ok(Json(
        quote(&state, &store, &cart, query.city.as_deref()).await?,
    ))
}

/// Add a product, merging with an existing line.
///
/// POST /api/store/{key}/cart/add
#[instrument(skip(state, session, request))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<Quote>> {
    let store = cart_store(&state, &key).await?;
    let product = state
        .catalog()
        .get_product(&request.product_id)
        .await?
        .filter(|p| p.store_id == store.id)
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    if !product.is_active() {
        return Err(AppError::BadRequest(format!(
            "{} is not available",
            product.name
        )));
    }

    let mut cart = load_cart(&session, &store).await?;
    cart.add(product.id.clone(), request.quantity);
    check_stock(&cart, &product)?;
    save_cart(&session, &store, &cart).await?;
    Ok(Json(quote(&state, &store, &cart, None).await?))
}

/// Set a line's quantity; zero or less removes it.
///
/// POST /api/store/{key}/cart/update
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<Quote>> {
    let store = cart_store(&state, &key).await?;
    let mut cart = load_cart(&session, &store).await?;
    cart.update(&request.product_id, request.quantity);
    if let Some(product) = state
        .catalog()
        .get_product(&request.product_id)
        .await?
        .filter(|p| p.store_id == store.id)
    {
        check_stock(&cart, &product)?;
    }
    save_cart(&session, &store, &cart).await?;
    Ok(Json(quote(&state, &store, &cart, None).await?))
}

/// POST /api/store/{key}/cart/remove
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<Quote>> {
    let store = cart_store(&state, &key).await?;
    let mut cart = load_cart(&session, &store).await?;
    cart.remove(&request.product_id);
    save_cart(&session, &store, &cart).await?;
    Ok(Json(quote(&state, &store, &cart, None).await?))
}

/// Place an order for the session's cart and empty it.
///
/// POST /api/store/{key}/checkout
#[instrument(skip(state, session, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let store = cart_store(&state, &key).await?;
    let cart = load_cart(&session, &store).await?;

    let order = state.orders().place_order(&store, &cart, request).await?;
    save_cart(&session, &store, &Cart::default()).await?;

    info!(order_id = %order.id, order_number = %order.order_number, "Checkout completed");
    Ok((StatusCode::CREATED, Json(order)))
}
