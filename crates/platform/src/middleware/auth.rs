//! Authentication extractors.
//!
//! The logged-in user lives in the session under
//! [`session_keys::CURRENT_USER`]. Role extractors reject anonymous requests
//! with 401 and wrong roles with 403, both as JSON error bodies.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use bazaar_core::UserRole;

use crate::models::{CurrentUser, session_keys};

/// Error returned when a route needs a user the request does not carry.
#[derive(Debug)]
pub enum AuthRejection {
    /// Nobody is logged in.
    Unauthorized,
    /// Logged in, but with the wrong role.
    Forbidden(&'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized: login required" })),
            )
                .into_response(),
            Self::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": format!("Forbidden: {message}") })),
            )
                .into_response(),
        }
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn require_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    session_user(parts).await.ok_or(AuthRejection::Unauthorized)
}

/// Extractor that requires any logged-in user.
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_user(parts).await.map(Self)
    }
}

/// Extractor that requires a platform admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn review(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Reviewing as {}", admin.display_name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = require_user(parts).await?;
        if user.role != UserRole::Admin {
            return Err(AuthRejection::Forbidden("admin access required"));
        }
        Ok(Self(user))
    }
}

/// Extractor that requires a merchant account.
pub struct RequireMerchant(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireMerchant
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = require_user(parts).await?;
        if user.role != UserRole::Merchant {
            return Err(AuthRejection::Forbidden("merchant access required"));
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike [`RequireUser`], this does not reject anonymous requests.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Helper to set the current user in the session.
///
/// The session id is cycled first so a login never reuses an anonymous id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
