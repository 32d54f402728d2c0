//! Platform accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, UserId, UserRole};

use crate::db::{Document, collections};

/// A login account (admin, merchant or customer).
///
/// The stored document carries the password hash; API responses use
/// [`super::CurrentUser`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub role: UserRole,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Document for User {
    const COLLECTION: &'static str = collections::USERS;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}
