//! Tenancy configuration.

use crate::error::TenantryResult;
use crate::schema::SchemaName;

/// Settings shared by the lifecycle and auth layers.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Reserved schema name of the public (cross-tenant) tenant.
    pub public_schema_name: String,
    /// Base domain appended to tenant slugs when provisioning
    /// (e.g. `acme` becomes `acme.example.com`).
    pub base_domain: String,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            public_schema_name: "public".into(),
            base_domain: "example.com".into(),
        }
    }
}

impl TenancyConfig {
    /// The reserved public schema as a handle.
    pub fn public_schema(&self) -> TenantryResult<SchemaName> {
        SchemaName::new(self.public_schema_name.clone())
    }

    pub fn is_public_schema(&self, schema: &SchemaName) -> bool {
        schema.as_str() == self.public_schema_name
    }
}
