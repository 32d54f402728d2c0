//! Authentication service.
//!
//! Email + password accounts with a role. Passwords are hashed with
//! Argon2id; emails are normalized by [`Email::parse`] so lookups are
//! case-insensitive.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::info;

use bazaar_core::{Email, UserId, UserRole};

use crate::db::{DocumentStore, Repository, StorageError};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: Repository<'a, User>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore) -> Self {
        Self {
            users: Repository::new(docs),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::MissingName);
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let user = User {
            id: UserId::generate(),
            email,
            display_name: display_name.to_owned(),
            role,
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };

        self.users.insert(&user).await.map_err(|e| match e {
            StorageError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Storage(other),
        })?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    /// Look up an account by email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the lookup fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .find_by("email", email.as_str())
            .await?
            .into_iter()
            .next())
    }

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the lookup fails.
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(id.as_str()).await?)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
