//! Merchant side of store applications.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireMerchant;
use crate::models::{ApplicationForm, StoreApplication};
use crate::state::AppState;

/// Submit an application to open a store.
///
/// POST /api/applications
#[instrument(skip_all, fields(merchant_id = %merchant.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Json(form): Json<ApplicationForm>,
) -> Result<(StatusCode, Json<StoreApplication>)> {
    let application = state.applications().submit(&merchant.id, form).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// The merchant's most recent application.
///
/// GET /api/applications/mine
pub async fn mine(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<Json<StoreApplication>> {
    state
        .applications()
        .get_by_merchant(&merchant.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("application".to_string()))
}
