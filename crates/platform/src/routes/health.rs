//! Health and status endpoints.

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::db::collections;
use crate::error::Result;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the primary document store. Returns 503 Service Unavailable when
/// it is unreachable, even if a fallback is still answering requests.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.documents().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    pub storage: String,
    pub backend: &'static str,
    pub primary_healthy: bool,
    pub collections: BTreeMap<&'static str, u64>,
    pub sync_subscribers: usize,
}

/// Backend status and document counts.
pub async fn status(State(state): State<AppState>) -> Result<Json<PlatformStatus>> {
    let docs = state.documents();
    let mut counts = BTreeMap::new();
    for &collection in collections::ALL {
        counts.insert(collection, docs.count(collection).await?);
    }

    Ok(Json(PlatformStatus {
        storage: state.config().storage.to_string(),
        backend: docs.backend(),
        primary_healthy: docs.ping().await.is_ok(),
        collections: counts,
        sync_subscribers: state.sync().subscriber_count(),
    }))
}
