//! Business logic layer.
//!
//! Services borrow the document store and the sync hub from
//! [`crate::state::AppState`] for the duration of one operation, the same
//! way repositories borrow a pool. Every mutation publishes a
//! [`sync::SyncEvent`] after it is stored.

pub mod applications;
pub mod auth;
pub mod catalog;
pub mod orders;
pub mod resolution;
pub mod storefront;
pub mod stores;
pub mod sync;

use thiserror::Error;

use crate::db::StorageError;

pub use applications::ApplicationService;
pub use auth::{AuthError, AuthService};
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use storefront::StorefrontService;
pub use stores::StoreService;
pub use sync::{SyncEvent, SyncHub, SyncMessage};

/// Errors returned by the domain services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Referenced entity does not exist (or is outside the caller's store).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation conflicts with the entity's current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Caller may not act on this entity.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Reject blank required text fields.
pub(crate) fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Invalid(format!("{field} is required")));
    }
    Ok(())
}
