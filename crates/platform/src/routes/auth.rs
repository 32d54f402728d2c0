//! Authentication route handlers.
//!
//! JSON endpoints; the logged-in user is kept in the session cookie.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use bazaar_core::UserRole;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// `merchant` or `customer` (default). Admins are created with the CLI.
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and log it in.
///
/// POST /auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let role = request.role.unwrap_or(UserRole::Customer);
    if role == UserRole::Admin {
        return Err(AppError::Forbidden(
            "admin accounts cannot self-register".to_string(),
        ));
    }

    let user = state
        .auth()
        .register(&request.email, &request.password, &request.display_name, role)
        .await?;
    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    Ok((StatusCode::CREATED, Json(current)))
}

/// Log in with email and password.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentUser>> {
    let user = state.auth().login(&request.email, &request.password).await?;
    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    info!(user_id = %current.id, role = %current.role, "User logged in");
    Ok(Json(current))
}

/// Logout and clear session.
///
/// POST /auth/logout
pub async fn logout(session: Session) -> StatusCode {
    let _ = clear_current_user(&session).await;
    clear_sentry_user();
    StatusCode::NO_CONTENT
}

/// The logged-in user.
///
/// GET /auth/me
pub async fn me(RequireUser(user): RequireUser) -> Json<CurrentUser> {
    Json(user)
}
