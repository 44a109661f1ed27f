//! Tenant domain model.
//!
//! A tenant is an isolated customer workspace backed by a dedicated
//! schema. The public tenant is a singleton distinguished by the
//! reserved public schema name; it holds cross-tenant data and can
//! never be deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::SchemaName;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Schema backing this tenant's isolated data.
    pub schema_name: SchemaName,
    /// URL-safe name the tenant was provisioned under (e.g. `acme`).
    pub slug: String,
    /// Human-readable name.
    pub name: String,
    /// The owning public user. Always linked; changes only through
    /// ownership transfer.
    pub owner_id: Uuid,
    /// Whether the backing schema is created when the tenant is saved.
    pub auto_create_schema: bool,
    /// Whether the backing schema is dropped on forced removal.
    pub auto_drop_schema: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub schema_name: SchemaName,
    pub slug: String,
    pub name: String,
    pub owner_id: Uuid,
}
