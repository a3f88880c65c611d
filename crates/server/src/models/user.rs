//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tavola_core::{Email, UserId, UserRole};

/// A Tavola account (domain type).
///
/// The password hash never leaves the repository layer; this type is safe
/// to serialize into API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller, as stored in the session.
///
/// Deliberately small: id, email, name, and role are all the handlers need
/// to authorize a request; everything else is loaded on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

impl CurrentUser {
    /// Whether this caller is a platform admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
