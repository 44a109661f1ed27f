//! Public (cross-tenant) user domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserStatus;

/// A global identity record, potentially linked to many tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    /// Natural key, unique across the public schema.
    pub email: String,
    pub password_hash: String,
    pub status: UserStatus,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicUser {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePublicUser {
    pub username: String,
    pub email: String,
    /// Already-hashed password (hashing happens in the auth layer).
    pub password_hash: String,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePublicUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub status: Option<UserStatus>,
    pub is_verified: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}
