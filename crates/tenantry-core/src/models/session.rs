//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::SchemaName;

/// A server-side session record scoped to one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub schema_name: SchemaName,
    pub user_id: Uuid,
    /// SHA-256 of the opaque session token handed to the client.
    pub token_hash: String,
    /// HMAC over the user's password hash at login time. Re-verified
    /// on every resolution so password changes invalidate sessions.
    pub auth_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRecord {
    pub schema_name: SchemaName,
    pub user_id: Uuid,
    pub token_hash: String,
    pub auth_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}
