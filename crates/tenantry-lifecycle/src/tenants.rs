//! Tenant lifecycle: provisioning, membership linkage, ownership
//! transfer and retirement.
//!
//! All linkage mutations reject the public tenant and run their row
//! changes through the membership repository's atomic combined
//! mutations, so a crash can never leave a membership edge without its
//! supervisor link or vice versa. Provisioning instead compensates:
//! each step explicitly deletes the rows created before it on failure.

use chrono::Utc;
use tenantry_auth::config::AuthConfig;
use tenantry_auth::password;
use tenantry_core::config::TenancyConfig;
use tenantry_core::error::{TenantryError, TenantryResult};
use tenantry_core::events::{EventBus, LifecycleEvent};
use tenantry_core::models::UserStatus;
use tenantry_core::models::domain::CreateDomain;
use tenantry_core::models::public_user::{CreatePublicUser, PublicUser};
use tenantry_core::models::tenant::{CreateTenant, Tenant};
use tenantry_core::models::tenant_user::{CreateTenantUser, TenantUser, UpdateTenantUser};
use tenantry_core::repository::{
    DomainRepository, MembershipRepository, PublicUserRepository, TenantRepository,
    TenantUserRepository,
};
use tenantry_core::schema::SchemaName;
use tracing::info;
use uuid::Uuid;

/// Tenant lifecycle operations, generic over the repository traits.
pub struct TenantService<TR, DR, PR, UR, MR>
where
    TR: TenantRepository,
    DR: DomainRepository,
    PR: PublicUserRepository,
    UR: TenantUserRepository,
    MR: MembershipRepository,
{
    tenants: TR,
    domains: DR,
    public_users: PR,
    tenant_users: UR,
    memberships: MR,
    events: EventBus,
    config: TenancyConfig,
    auth: AuthConfig,
}

impl<TR, DR, PR, UR, MR> TenantService<TR, DR, PR, UR, MR>
where
    TR: TenantRepository,
    DR: DomainRepository,
    PR: PublicUserRepository,
    UR: TenantUserRepository,
    MR: MembershipRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: TR,
        domains: DR,
        public_users: PR,
        tenant_users: UR,
        memberships: MR,
        events: EventBus,
        config: TenancyConfig,
        auth: AuthConfig,
    ) -> Self {
        Self {
            tenants,
            domains,
            public_users,
            tenant_users,
            memberships,
            events,
            config,
            auth,
        }
    }

    // -----------------------------------------------------------------
    // Provisioning
    // -----------------------------------------------------------------

    /// Provision a new tenant owned by the public user behind
    /// `owner_email`. Returns the tenant and its fully qualified
    /// domain.
    ///
    /// The schema name carries a unix-seconds suffix so that a
    /// provision / retire / provision cycle under the same slug never
    /// collides with the retired tenant's schema.
    pub async fn provision_tenant(
        &self,
        name: &str,
        slug: &str,
        owner_email: &str,
    ) -> TenantryResult<(Tenant, String)> {
        let owner = self.public_users.get_by_email(owner_email).await?;
        if !owner.is_active() {
            return Err(TenantryError::Inactive {
                reason: format!("owner {owner_email} is inactive"),
            });
        }

        let fqdn = format!("{slug}.{}", self.config.base_domain);
        match self.domains.get_by_domain(&fqdn).await {
            Ok(_) => {
                return Err(TenantryError::AlreadyExists {
                    entity: format!("domain {fqdn}"),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let schema = SchemaName::new(format!("{slug}_{}", Utc::now().timestamp()))?;

        let tenant = self
            .tenants
            .create(CreateTenant {
                schema_name: schema.clone(),
                slug: slug.to_owned(),
                name: name.to_owned(),
                owner_id: owner.id,
            })
            .await?;

        let domain = match self
            .domains
            .create(CreateDomain {
                domain: fqdn.clone(),
                tenant_id: tenant.id,
                is_primary: true,
            })
            .await
        {
            Ok(domain) => domain,
            Err(e) => {
                self.tenants.delete(tenant.id).await?;
                return Err(e);
            }
        };

        // The owner is always linked; seed their shadow identity.
        if let Err(e) = self
            .link_shadow_user(&tenant, &owner, owner.is_staff, true)
            .await
        {
            self.domains.delete(domain.id).await?;
            self.tenants.delete(tenant.id).await?;
            return Err(e);
        }

        info!(slug, schema = %schema, domain = %fqdn, "tenant provisioned");
        Ok((tenant, fqdn))
    }

    /// Bootstrap the singleton public tenant together with its owner
    /// account. The owner gets an unusable password: a random one is
    /// generated, hashed and immediately discarded.
    pub async fn create_public_tenant(
        &self,
        domain_url: &str,
        owner_email: &str,
        username: &str,
    ) -> TenantryResult<(Tenant, PublicUser)> {
        let schema = self.config.public_schema()?;
        match self.tenants.get_by_schema(&schema).await {
            Ok(_) => {
                return Err(TenantryError::AlreadyExists {
                    entity: format!("tenant {schema}"),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let password_hash =
            password::hash_password(&password::random_password(30), self.auth.pepper.as_deref())?;
        let owner = self
            .public_users
            .create(CreatePublicUser {
                username: username.to_owned(),
                email: owner_email.to_owned(),
                password_hash,
                is_verified: true,
                is_staff: true,
                is_superuser: true,
            })
            .await?;

        let tenant = self
            .tenants
            .create(CreateTenant {
                schema_name: schema.clone(),
                slug: self.config.public_schema_name.clone(),
                name: "Public Tenant".to_owned(),
                owner_id: owner.id,
            })
            .await?;

        if let Err(e) = self
            .domains
            .create(CreateDomain {
                domain: domain_url.to_owned(),
                tenant_id: tenant.id,
                is_primary: true,
            })
            .await
        {
            self.tenants.delete(tenant.id).await?;
            return Err(e);
        }

        info!(schema = %schema, domain = domain_url, "public tenant created");
        Ok((tenant, owner))
    }

    /// Create (or revive) a tenant user directly inside a tenant's
    /// schema, optionally supervised by an existing public user.
    pub async fn create_tenant_user(
        &self,
        slug: &str,
        email: &str,
        raw_password: &str,
        is_staff: bool,
        is_superuser: bool,
        related_user_email: Option<&str>,
    ) -> TenantryResult<TenantUser> {
        let tenant = self.tenants.get_by_slug(slug).await?;
        let schema = &tenant.schema_name;
        if self.config.is_public_schema(schema) {
            return Err(TenantryError::SchemaViolation {
                reason: "tenant users cannot live in the public schema".into(),
            });
        }

        let supervisor_id = match related_user_email {
            Some(related) => Some(self.public_users.get_by_email(related).await?.id),
            None => None,
        };

        let password_hash = password::hash_password(raw_password, self.auth.pepper.as_deref())?;

        match self.tenant_users.get_by_email(schema, email).await {
            Ok(existing) if existing.is_active() => Err(TenantryError::AlreadyExists {
                entity: format!("tenant user {email}"),
            }),
            Ok(existing) => {
                // Revive the retired row in place.
                self.tenant_users
                    .update(
                        schema,
                        existing.id,
                        UpdateTenantUser {
                            password_hash: Some(password_hash),
                            status: Some(UserStatus::Active),
                            is_staff: Some(is_staff),
                            is_superuser: Some(is_superuser),
                            supervisor_id: Some(supervisor_id),
                            ..UpdateTenantUser::default()
                        },
                    )
                    .await
            }
            Err(e) if e.is_not_found() => {
                let username = email.split('@').next().unwrap_or(email).to_owned();
                self.tenant_users
                    .create(
                        schema,
                        CreateTenantUser {
                            username,
                            email: email.to_owned(),
                            password_hash,
                            is_verified: false,
                            is_staff,
                            is_superuser,
                            supervisor_id,
                        },
                    )
                    .await
            }
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------
    // Linkage
    // -----------------------------------------------------------------

    /// Link a public user to a tenant by creating a fresh shadow
    /// tenant user for them.
    pub async fn add_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        is_staff: bool,
        is_superuser: bool,
    ) -> TenantryResult<TenantUser> {
        let tenant = self.get_regular_tenant(tenant_id).await?;
        let user = self.public_users.get_by_id(user_id).await?;
        let tenant_user = self
            .link_shadow_user(&tenant, &user, is_staff, is_superuser)
            .await?;

        self.events.emit(LifecycleEvent::UserAdded {
            user_id,
            tenant_id,
            schema: tenant.schema_name.clone(),
        });
        Ok(tenant_user)
    }

    /// Unlink a public user from a tenant.
    ///
    /// Soft removal clears the supervisor link and drops the
    /// membership edge but leaves the tenant user's groups and status
    /// untouched, so a later reconnect restores their footing. Hard
    /// removal additionally clears groups and deactivates the row.
    pub async fn remove_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        soft: bool,
    ) -> TenantryResult<()> {
        let tenant = self.get_regular_tenant(tenant_id).await?;
        let user = self.public_users.get_by_id(user_id).await?;
        if !user.is_active() {
            return Err(TenantryError::Inactive {
                reason: format!("user {} is inactive", user.email),
            });
        }
        if !self.memberships.is_linked(user_id, tenant_id).await? {
            return Err(TenantryError::NotFound {
                entity: "membership".into(),
                id: user_id.to_string(),
            });
        }
        if tenant.owner_id == user_id {
            return Err(TenantryError::DeleteForbidden {
                reason: "cannot remove the tenant owner; transfer ownership first".into(),
            });
        }

        let tenant_user_id = self
            .supervised_tenant_user(&tenant.schema_name, user_id)
            .await?
            .map(|tu| tu.id);
        self.memberships
            .unlink(&tenant.schema_name, tenant_id, user_id, tenant_user_id, !soft)
            .await?;

        self.events.emit(LifecycleEvent::UserRemoved {
            user_id,
            tenant_id,
            schema: tenant.schema_name.clone(),
            soft,
        });
        Ok(())
    }

    /// Attach a public user to a tenant user that already exists in
    /// the tenant's schema.
    pub async fn connect_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        tenant_user_email: &str,
    ) -> TenantryResult<TenantUser> {
        let tenant = self.get_regular_tenant(tenant_id).await?;
        let schema = &tenant.schema_name;
        self.public_users.get_by_id(user_id).await?;

        let tenant_user = self.tenant_users.get_by_email(schema, tenant_user_email).await?;
        if tenant_user.supervisor_id.is_some() {
            return Err(TenantryError::AlreadyExists {
                entity: format!("supervisor for tenant user {tenant_user_email}"),
            });
        }
        if self.memberships.is_linked(user_id, tenant_id).await? {
            return Err(TenantryError::AlreadyExists {
                entity: "membership".into(),
            });
        }

        self.memberships
            .link_existing_tenant_user(schema, tenant_id, user_id, tenant_user.id)
            .await?;

        self.events.emit(LifecycleEvent::UserConnected {
            user_id,
            tenant_id,
            schema: schema.clone(),
        });
        self.tenant_users.get_by_id(schema, tenant_user.id).await
    }

    /// Detach a public user from their tenant user, leaving the
    /// tenant user row intact.
    pub async fn disconnect_user(&self, tenant_id: Uuid, user_id: Uuid) -> TenantryResult<()> {
        let tenant = self.get_regular_tenant(tenant_id).await?;
        if !self.memberships.is_linked(user_id, tenant_id).await? {
            return Err(TenantryError::NotFound {
                entity: "membership".into(),
                id: user_id.to_string(),
            });
        }

        let tenant_user_id = self
            .supervised_tenant_user(&tenant.schema_name, user_id)
            .await?
            .map(|tu| tu.id);
        self.memberships
            .unlink(&tenant.schema_name, tenant_id, user_id, tenant_user_id, false)
            .await?;

        self.events.emit(LifecycleEvent::UserDisconnected {
            user_id,
            tenant_id,
            schema: tenant.schema_name.clone(),
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------

    /// Transfer tenant ownership. The old owner is demoted (and
    /// soft-removed when they hold no groups); the new owner is
    /// promoted to superuser, being linked first if necessary. Calling
    /// this with the current owner is a no-op.
    pub async fn transfer_ownership(
        &self,
        tenant_id: Uuid,
        new_owner_id: Uuid,
    ) -> TenantryResult<Tenant> {
        let tenant = self.get_regular_tenant(tenant_id).await?;
        if tenant.owner_id == new_owner_id {
            return Ok(tenant);
        }
        let schema = &tenant.schema_name;

        let new_owner = self.public_users.get_by_id(new_owner_id).await?;
        if !new_owner.is_active() {
            return Err(TenantryError::Inactive {
                reason: format!("new owner {} is inactive", new_owner.email),
            });
        }

        // Demote the outgoing owner.
        if let Some(old_tu) = self.supervised_tenant_user(schema, tenant.owner_id).await? {
            let demoted = self
                .tenant_users
                .update(
                    schema,
                    old_tu.id,
                    UpdateTenantUser {
                        is_superuser: Some(false),
                        ..UpdateTenantUser::default()
                    },
                )
                .await?;
            if demoted.groups.is_empty() {
                self.memberships
                    .unlink(schema, tenant_id, tenant.owner_id, Some(old_tu.id), false)
                    .await?;
                self.events.emit(LifecycleEvent::UserRemoved {
                    user_id: tenant.owner_id,
                    tenant_id,
                    schema: schema.clone(),
                    soft: true,
                });
            }
        }

        // Promote the incoming owner.
        match self.supervised_tenant_user(schema, new_owner_id).await? {
            Some(new_tu) => {
                self.tenant_users
                    .update(
                        schema,
                        new_tu.id,
                        UpdateTenantUser {
                            is_superuser: Some(true),
                            ..UpdateTenantUser::default()
                        },
                    )
                    .await?;
            }
            None => {
                self.link_shadow_user(&tenant, &new_owner, new_owner.is_staff, true)
                    .await?;
                self.events.emit(LifecycleEvent::UserAdded {
                    user_id: new_owner_id,
                    tenant_id,
                    schema: schema.clone(),
                });
            }
        }

        let updated = self.tenants.set_owner(tenant_id, new_owner_id).await?;
        info!(tenant = %schema, new_owner = %new_owner_id, "ownership transferred");
        Ok(updated)
    }

    /// Retire a tenant without deleting its row.
    ///
    /// Every linked non-owner is removed hard, the primary domain is
    /// rewritten out of the way (freeing the hostname for a future
    /// tenant under the same slug), ownership passes to the public
    /// tenant's owner and the old owner is removed.
    pub async fn delete_tenant(&self, tenant_id: Uuid) -> TenantryResult<Tenant> {
        let tenant = self.tenants.get_by_id(tenant_id).await?;
        if self.config.is_public_schema(&tenant.schema_name) {
            return Err(TenantryError::Validation {
                message: "cannot delete the public tenant".into(),
            });
        }

        for user in self.memberships.users_of(tenant_id).await? {
            if user.id == tenant.owner_id {
                continue;
            }
            self.remove_user(tenant_id, user.id, false).await?;
        }

        let old_owner_id = tenant.owner_id;
        let primary = self.domains.primary_for(tenant_id).await?;
        let retired = format!(
            "{}-{}-{}",
            Utc::now().timestamp(),
            old_owner_id,
            primary.domain
        );
        self.domains.rename(primary.id, &retired).await?;

        let public_schema = self.config.public_schema()?;
        let public_tenant = self.tenants.get_by_schema(&public_schema).await?;
        let updated = self
            .transfer_ownership(tenant_id, public_tenant.owner_id)
            .await?;

        // The tenant may already belong to the public owner, in which
        // case there is no outgoing owner to remove.
        if old_owner_id != updated.owner_id
            && self.memberships.is_linked(old_owner_id, tenant_id).await?
        {
            self.remove_user(tenant_id, old_owner_id, false).await?;
        }

        info!(tenant = %tenant.schema_name, "tenant retired");
        Ok(updated)
    }

    /// Look up a tenant by its schema name.
    pub async fn tenant_by_schema(&self, schema: &SchemaName) -> TenantryResult<Tenant> {
        self.tenants.get_by_schema(schema).await
    }

    /// Tenants a public user is linked to.
    pub async fn tenants_of(&self, user_id: Uuid) -> TenantryResult<Vec<Tenant>> {
        self.memberships.tenants_of(user_id).await
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Load a tenant and reject the public one.
    async fn get_regular_tenant(&self, tenant_id: Uuid) -> TenantryResult<Tenant> {
        let tenant = self.tenants.get_by_id(tenant_id).await?;
        if self.config.is_public_schema(&tenant.schema_name) {
            return Err(TenantryError::SchemaViolation {
                reason: "operation not permitted on the public tenant".into(),
            });
        }
        Ok(tenant)
    }

    /// The tenant user supervised by `user_id` in this schema, if any.
    async fn supervised_tenant_user(
        &self,
        schema: &SchemaName,
        user_id: Uuid,
    ) -> TenantryResult<Option<TenantUser>> {
        match self.tenant_users.get_by_supervisor(schema, user_id).await {
            Ok(tu) => Ok(Some(tu)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a shadow tenant user for a public user and the matching
    /// membership edge, atomically.
    ///
    /// The shadow identity reuses the public user's password hash so
    /// credentials follow the global account, while the unix-time
    /// suffix keeps the per-schema natural keys clear of tenant users
    /// created directly under the same address.
    async fn link_shadow_user(
        &self,
        tenant: &Tenant,
        user: &PublicUser,
        is_staff: bool,
        is_superuser: bool,
    ) -> TenantryResult<TenantUser> {
        let schema = &tenant.schema_name;
        if self.memberships.is_linked(user.id, tenant.id).await? {
            return Err(TenantryError::AlreadyExists {
                entity: "membership".into(),
            });
        }
        if self.supervised_tenant_user(schema, user.id).await?.is_some() {
            return Err(TenantryError::AlreadyExists {
                entity: format!("tenant user supervised by {}", user.email),
            });
        }

        let suffix = Utc::now().timestamp();
        let username = format!("{}_{suffix}", user.username);
        let email = match user.email.split_once('@') {
            Some((local, domain)) => format!("{local}+{suffix}@{domain}"),
            None => format!("{}+{suffix}", user.email),
        };

        self.memberships
            .link_new_tenant_user(
                schema,
                tenant.id,
                user.id,
                CreateTenantUser {
                    username,
                    email,
                    password_hash: user.password_hash.clone(),
                    is_verified: user.is_verified,
                    is_staff,
                    is_superuser,
                    supervisor_id: Some(user.id),
                },
            )
            .await
    }
}
