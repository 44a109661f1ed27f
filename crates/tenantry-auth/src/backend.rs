//! Schema-scoped credential verification.

use tenantry_core::config::TenancyConfig;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::tenant_user::TenantUser;
use tenantry_core::repository::TenantUserRepository;
use tenantry_core::schema::SchemaName;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::password;

/// Verifies credentials against the tenant user table of the active
/// schema. Refuses to authenticate in the public schema: the public
/// schema has no per-tenant users, so every attempt there resolves to
/// "no user" rather than an error.
pub struct CredentialBackend<T: TenantUserRepository> {
    tenant_users: T,
    config: AuthConfig,
    tenancy: TenancyConfig,
}

impl<T: TenantUserRepository> CredentialBackend<T> {
    pub fn new(tenant_users: T, config: AuthConfig, tenancy: TenancyConfig) -> Self {
        Self {
            tenant_users,
            config,
            tenancy,
        }
    }

    /// Authenticate by email and password within a schema.
    ///
    /// Returns `Ok(None)` for any of: public schema, unknown email,
    /// wrong password, inactive account. Only infrastructure failures
    /// surface as errors, so callers cannot distinguish the rejection
    /// reasons.
    pub async fn authenticate(
        &self,
        schema: &SchemaName,
        email: &str,
        raw_password: &str,
    ) -> TenantryResult<Option<TenantUser>> {
        if self.tenancy.is_public_schema(schema) {
            debug!(schema = %schema, "authentication attempted in public schema");
            return Ok(None);
        }

        let user = match self.tenant_users.get_by_email(schema, email).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                // Equalize timing with the known-user path.
                password::burn_hash(raw_password, self.config.pepper.as_deref());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let verified = password::verify_password(
            raw_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !verified {
            return Ok(None);
        }

        if !user.is_active() {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Load a user by id within a schema, filtering out inactive
    /// accounts the same way [`Self::authenticate`] does.
    pub async fn get_user(
        &self,
        schema: &SchemaName,
        user_id: Uuid,
    ) -> TenantryResult<Option<TenantUser>> {
        if self.tenancy.is_public_schema(schema) {
            return Ok(None);
        }

        match self.tenant_users.get_by_id(schema, user_id).await {
            Ok(user) if user.is_active() => Ok(Some(user)),
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
