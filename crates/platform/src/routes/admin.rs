//! Admin review of store applications and the store directory.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{ApplicationId, ApplicationStatus};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ApplicationStats, Store, StoreApplication};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationsQuery {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub application: StoreApplication,
    pub store: Store,
}

/// GET /api/admin/applications
pub async fn list_applications(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ApplicationsQuery>,
) -> Result<Json<Vec<StoreApplication>>> {
    Ok(Json(state.applications().list(query.status).await?))
}

/// GET /api/admin/applications/stats
pub async fn application_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApplicationStats>> {
    Ok(Json(state.applications().stats().await?))
}

/// GET /api/admin/applications/{id}
pub async fn show_application(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ApplicationId>,
) -> Result<Json<StoreApplication>> {
    state
        .applications()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("application".to_string()))
}

/// Approve an application and open its store.
///
/// POST /api/admin/applications/{id}/approve
#[instrument(skip_all, fields(application_id = %id, reviewer_id = %admin.id))]
pub async fn approve_application(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ApplicationId>,
) -> Result<Json<ApprovalResponse>> {
    let (application, store) = state.applications().approve(&id, &admin.id).await?;
    Ok(Json(ApprovalResponse { application, store }))
}

/// POST /api/admin/applications/{id}/reject
#[instrument(skip_all, fields(application_id = %id, reviewer_id = %admin.id))]
pub async fn reject_application(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ApplicationId>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<StoreApplication>> {
    Ok(Json(
        state
            .applications()
            .reject(&id, &admin.id, &request.reason)
            .await?,
    ))
}

/// GET /api/admin/stores
pub async fn list_stores(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Store>>> {
    Ok(Json(state.stores().list_stores().await?))
}
