//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories take
//! an explicit [`SchemaName`] handle on every call — data isolation is
//! never carried in connection state.

use uuid::Uuid;

use crate::error::TenantryResult;
use crate::models::{
    domain::{CreateDomain, Domain},
    public_user::{CreatePublicUser, PublicUser, UpdatePublicUser},
    session::{CreateSessionRecord, SessionRecord},
    tenant::{CreateTenant, Tenant},
    tenant_user::{CreateTenantUser, TenantUser, UpdateTenantUser},
};
use crate::schema::SchemaName;

// ---------------------------------------------------------------------------
// Public scope
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = TenantryResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TenantryResult<Tenant>> + Send;
    fn get_by_schema(
        &self,
        schema: &SchemaName,
    ) -> impl Future<Output = TenantryResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = TenantryResult<Tenant>> + Send;
    /// Reassign the owner. Bumps `modified_at`.
    fn set_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = TenantryResult<Tenant>> + Send;
    /// Hard delete. Only used to compensate a failed provisioning;
    /// retired tenants keep their row forever.
    fn delete(&self, id: Uuid) -> impl Future<Output = TenantryResult<()>> + Send;
}

pub trait DomainRepository: Send + Sync {
    fn create(&self, input: CreateDomain) -> impl Future<Output = TenantryResult<Domain>> + Send;
    fn get_by_domain(&self, domain: &str) -> impl Future<Output = TenantryResult<Domain>> + Send;
    /// The tenant's primary domain row.
    fn primary_for(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = TenantryResult<Domain>> + Send;
    /// Rewrite the hostname of an existing row (tenant retirement).
    fn rename(
        &self,
        id: Uuid,
        new_domain: &str,
    ) -> impl Future<Output = TenantryResult<Domain>> + Send;
    /// Hard delete. Only used to compensate a failed provisioning.
    fn delete(&self, id: Uuid) -> impl Future<Output = TenantryResult<()>> + Send;
}

pub trait PublicUserRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePublicUser,
    ) -> impl Future<Output = TenantryResult<PublicUser>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TenantryResult<PublicUser>> + Send;
    fn get_by_email(&self, email: &str)
    -> impl Future<Output = TenantryResult<PublicUser>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePublicUser,
    ) -> impl Future<Output = TenantryResult<PublicUser>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant scope
// ---------------------------------------------------------------------------

pub trait TenantUserRepository: Send + Sync {
    fn create(
        &self,
        schema: &SchemaName,
        input: CreateTenantUser,
    ) -> impl Future<Output = TenantryResult<TenantUser>> + Send;
    fn get_by_id(
        &self,
        schema: &SchemaName,
        id: Uuid,
    ) -> impl Future<Output = TenantryResult<TenantUser>> + Send;
    fn get_by_email(
        &self,
        schema: &SchemaName,
        email: &str,
    ) -> impl Future<Output = TenantryResult<TenantUser>> + Send;
    /// The tenant user supervised by the given public user, if one
    /// exists in this schema. `NotFound` otherwise.
    fn get_by_supervisor(
        &self,
        schema: &SchemaName,
        supervisor_id: Uuid,
    ) -> impl Future<Output = TenantryResult<TenantUser>> + Send;
    fn update(
        &self,
        schema: &SchemaName,
        id: Uuid,
        input: UpdateTenantUser,
    ) -> impl Future<Output = TenantryResult<TenantUser>> + Send;
}

/// The public-user / tenant many-to-many join, plus the combined
/// mutations that must commit atomically with it.
pub trait MembershipRepository: Send + Sync {
    fn is_linked(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = TenantryResult<bool>> + Send;
    fn tenants_of(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = TenantryResult<Vec<Tenant>>> + Send;
    fn users_of(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = TenantryResult<Vec<PublicUser>>> + Send;

    /// Create a fresh tenant user and the membership edge in one
    /// transaction (the add-user path).
    fn link_new_tenant_user(
        &self,
        schema: &SchemaName,
        tenant_id: Uuid,
        user_id: Uuid,
        input: CreateTenantUser,
    ) -> impl Future<Output = TenantryResult<TenantUser>> + Send;

    /// Attach a supervisor to a pre-existing tenant user and create the
    /// membership edge in one transaction (the connect-user path).
    fn link_existing_tenant_user(
        &self,
        schema: &SchemaName,
        tenant_id: Uuid,
        user_id: Uuid,
        tenant_user_id: Uuid,
    ) -> impl Future<Output = TenantryResult<()>> + Send;

    /// Drop the membership edge and clear the supervisor link in one
    /// transaction. With `hard`, additionally clear the tenant user's
    /// groups and deactivate it. `tenant_user_id` is `None` when the
    /// pair is in the linked-no-tenant-user state.
    fn unlink(
        &self,
        schema: &SchemaName,
        tenant_id: Uuid,
        user_id: Uuid,
        tenant_user_id: Option<Uuid>,
        hard: bool,
    ) -> impl Future<Output = TenantryResult<()>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSessionRecord,
    ) -> impl Future<Output = TenantryResult<SessionRecord>> + Send;
    fn get_by_token_hash(
        &self,
        schema: &SchemaName,
        token_hash: &str,
    ) -> impl Future<Output = TenantryResult<SessionRecord>> + Send;
    /// Invalidate a single session (logout / flush on hash mismatch).
    fn delete(
        &self,
        schema: &SchemaName,
        id: Uuid,
    ) -> impl Future<Output = TenantryResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g. on password change).
    fn invalidate_user_sessions(
        &self,
        schema: &SchemaName,
        user_id: Uuid,
    ) -> impl Future<Output = TenantryResult<()>> + Send;
    /// Remove all expired sessions.
    fn cleanup_expired(
        &self,
        schema: &SchemaName,
    ) -> impl Future<Output = TenantryResult<u64>> + Send;
}
