//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a platform admin (admins cannot self-register over HTTP)
//! bazaar-cli user create -e admin@example.com -n "Admin Name" -r admin -p 'long-password'
//! ```

use bazaar_core::{UserId, UserRole};
use bazaar_platform::db::PgDocumentStore;
use bazaar_platform::services::AuthService;

use super::{CliError, connect};

/// Create a user account.
///
/// # Arguments
///
/// * `email` - Login email
/// * `name` - Display name
/// * `role` - `admin`, `merchant` or `customer`
/// * `password` - Initial password (at least 8 characters)
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error for an unknown role, an invalid email or password, an
/// email that is already registered, or a database failure.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<UserId, CliError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    let docs = PgDocumentStore::new(connect().await?);

    tracing::info!("Creating user: {} ({})", email, role);
    let user = AuthService::new(&docs)
        .register(email, password, name, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id)
}
