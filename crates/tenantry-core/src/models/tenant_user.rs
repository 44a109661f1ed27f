//! Tenant-scoped user domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserStatus;
use crate::schema::SchemaName;

/// A per-schema identity record living inside one tenant's schema.
///
/// A tenant user may be supervised by (linked to) a public user; the
/// supervisor back-reference is what ties the two user kinds together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUser {
    pub id: Uuid,
    pub schema_name: SchemaName,
    pub username: String,
    /// Natural key, unique within the schema.
    pub email: String,
    pub password_hash: String,
    pub status: UserStatus,
    pub is_verified: bool,
    /// Tenant-scoped permission flags.
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Permission group names within this tenant.
    pub groups: Vec<String>,
    /// Back-reference to the controlling public user, if any.
    pub supervisor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantUser {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub supervisor_id: Option<Uuid>,
}

/// Partial update; `None` fields are left unchanged.
///
/// `supervisor_id` is doubly optional: `Some(Some(id))` sets the link,
/// `Some(None)` clears it, `None` leaves it alone.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenantUser {
    pub password_hash: Option<String>,
    pub status: Option<UserStatus>,
    pub is_verified: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub groups: Option<Vec<String>>,
    pub supervisor_id: Option<Option<Uuid>>,
}
