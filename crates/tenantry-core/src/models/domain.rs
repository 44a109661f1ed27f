//! Domain (hostname) rows attached to tenants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    /// Fully qualified domain, unique across all tenants.
    pub domain: String,
    pub tenant_id: Uuid,
    /// Exactly one primary domain exists per tenant.
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDomain {
    pub domain: String,
    pub tenant_id: Uuid,
    pub is_primary: bool,
}
