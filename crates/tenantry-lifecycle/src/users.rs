//! Public-user lifecycle.
//!
//! Accounts are never physically deleted: removal marks the row
//! Inactive, and creating an account over a retired identity revives
//! the original row so its history survives.

use tenantry_auth::config::AuthConfig;
use tenantry_auth::password;
use tenantry_core::config::TenancyConfig;
use tenantry_core::error::{TenantryError, TenantryResult};
use tenantry_core::events::{EventBus, LifecycleEvent};
use tenantry_core::models::UserStatus;
use tenantry_core::models::public_user::{CreatePublicUser, PublicUser, UpdatePublicUser};
use tenantry_core::models::tenant::Tenant;
use tenantry_core::schema::SchemaName;
use tenantry_core::repository::{
    DomainRepository, MembershipRepository, PublicUserRepository, TenantRepository,
    TenantUserRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::tenants::TenantService;

/// Length of the random password assigned when none is supplied.
const GENERATED_PASSWORD_LEN: usize = 30;

/// Parameters for creating a public user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// When `None`, a random password is generated, effectively
    /// locking the account until a reset.
    pub password: Option<String>,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Public-user lifecycle operations.
///
/// Owns a [`TenantService`] so that deleting a user can cascade
/// through the tenants they own or belong to.
pub struct UserService<TR, DR, PR, UR, MR>
where
    TR: TenantRepository,
    DR: DomainRepository,
    PR: PublicUserRepository,
    UR: TenantUserRepository,
    MR: MembershipRepository,
{
    tenant_service: TenantService<TR, DR, PR, UR, MR>,
    public_users: PR,
    memberships: MR,
    events: EventBus,
    config: TenancyConfig,
    auth: AuthConfig,
}

impl<TR, DR, PR, UR, MR> UserService<TR, DR, PR, UR, MR>
where
    TR: TenantRepository,
    DR: DomainRepository,
    PR: PublicUserRepository,
    UR: TenantUserRepository,
    MR: MembershipRepository,
{
    pub fn new(
        tenant_service: TenantService<TR, DR, PR, UR, MR>,
        public_users: PR,
        memberships: MR,
        events: EventBus,
        config: TenancyConfig,
        auth: AuthConfig,
    ) -> Self {
        Self {
            tenant_service,
            public_users,
            memberships,
            events,
            config,
            auth,
        }
    }

    pub fn tenants(&self) -> &TenantService<TR, DR, PR, UR, MR> {
        &self.tenant_service
    }

    /// Create a public user, or revive a retired one under the same
    /// email. An active user under the email is a conflict.
    pub async fn create_user(&self, input: NewUser) -> TenantryResult<PublicUser> {
        let email = normalize_email(&input.email)?;
        let raw_password = input
            .password
            .clone()
            .unwrap_or_else(|| password::random_password(GENERATED_PASSWORD_LEN));
        let password_hash = password::hash_password(&raw_password, self.auth.pepper.as_deref())?;

        let user = match self.public_users.get_by_email(&email).await {
            Ok(existing) if existing.is_active() => {
                return Err(TenantryError::AlreadyExists {
                    entity: format!("user {email}"),
                });
            }
            Ok(existing) => {
                self.public_users
                    .update(
                        existing.id,
                        UpdatePublicUser {
                            username: Some(input.username),
                            password_hash: Some(password_hash),
                            status: Some(UserStatus::Active),
                            is_verified: Some(input.is_verified),
                            is_staff: Some(input.is_staff),
                            is_superuser: Some(input.is_superuser),
                            ..UpdatePublicUser::default()
                        },
                    )
                    .await?
            }
            Err(e) if e.is_not_found() => {
                self.public_users
                    .create(CreatePublicUser {
                        username: input.username,
                        email,
                        password_hash,
                        is_verified: input.is_verified,
                        is_staff: input.is_staff,
                        is_superuser: input.is_superuser,
                    })
                    .await?
            }
            Err(e) => return Err(e),
        };

        info!(user = %user.email, "public user created");
        self.events
            .emit(LifecycleEvent::UserCreated { user_id: user.id });
        Ok(user)
    }

    /// Convenience wrapper creating a verified staff superuser.
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password: Option<String>,
    ) -> TenantryResult<PublicUser> {
        self.create_user(NewUser {
            username: username.to_owned(),
            email: email.to_owned(),
            password,
            is_verified: true,
            is_staff: true,
            is_superuser: true,
        })
        .await
    }

    /// Retire a public user, cascading through their tenants: owned
    /// tenants are retired whole, other memberships are removed hard.
    /// The row itself survives as Inactive.
    pub async fn delete_user(&self, user_id: Uuid) -> TenantryResult<()> {
        let user = self.public_users.get_by_id(user_id).await?;
        if !user.is_active() {
            return Err(TenantryError::Inactive {
                reason: format!("user {} is already inactive", user.email),
            });
        }

        let public_schema = self.config.public_schema()?;
        if let Some(public_tenant) = self.public_tenant(&public_schema).await?
            && public_tenant.owner_id == user_id
        {
            return Err(TenantryError::DeleteForbidden {
                reason: "cannot delete the public tenant owner".into(),
            });
        }

        for tenant in self.memberships.tenants_of(user_id).await? {
            if self.config.is_public_schema(&tenant.schema_name) {
                continue;
            }
            if tenant.owner_id == user_id {
                self.tenant_service.delete_tenant(tenant.id).await?;
            } else {
                self.tenant_service.remove_user(tenant.id, user_id, false).await?;
            }
        }

        self.public_users
            .update(
                user_id,
                UpdatePublicUser {
                    status: Some(UserStatus::Inactive),
                    ..UpdatePublicUser::default()
                },
            )
            .await?;

        info!(user = %user.email, "public user retired");
        self.events
            .emit(LifecycleEvent::UserDeleted { user_id });
        Ok(())
    }

    /// The public tenant, or `None` before bootstrap.
    async fn public_tenant(&self, schema: &SchemaName) -> TenantryResult<Option<Tenant>> {
        match self.tenant_service.tenant_by_schema(schema).await {
            Ok(tenant) => Ok(Some(tenant)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Trim the address and lowercase its domain part.
fn normalize_email(email: &str) -> TenantryResult<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(TenantryError::Validation {
            message: "email address is required".into(),
        });
    }
    let Some((local, domain)) = trimmed.rsplit_once('@') else {
        return Err(TenantryError::Validation {
            message: format!("invalid email address: {trimmed}"),
        });
    };
    Ok(format!("{local}@{}", domain.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn normalize_lowercases_domain_only() {
        assert_eq!(
            normalize_email("Alice@EXAMPLE.Com").unwrap(),
            "Alice@example.com"
        );
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(
            normalize_email("  bob@example.com  ").unwrap(),
            "bob@example.com"
        );
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(normalize_email("   ").is_err());
    }

    #[test]
    fn address_without_at_sign_is_rejected() {
        assert!(normalize_email("not-an-address").is_err());
    }
}
