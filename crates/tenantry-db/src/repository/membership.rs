//! SurrealDB implementation of [`MembershipRepository`].
//!
//! The public-user/tenant join is a `member_of` graph edge. Mutations
//! that must not leave partial linkage state behind (create-and-link,
//! connect, unlink) run as explicit transactions so either every
//! constituent row change commits or none do.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::public_user::PublicUser;
use tenantry_core::models::tenant::Tenant;
use tenantry_core::models::tenant_user::{CreateTenantUser, TenantUser};
use tenantry_core::repository::MembershipRepository;
use tenantry_core::schema::SchemaName;
use uuid::Uuid;

use super::{CountRow, parse_schema, parse_status, parse_uuid};
use crate::error::DbError;

/// Tenant row fetched through the membership edge.
#[derive(Debug, SurrealValue)]
struct MemberTenantRow {
    record_id: String,
    schema_name: String,
    slug: String,
    name: String,
    owner_id: String,
    auto_create_schema: bool,
    auto_drop_schema: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl MemberTenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid(&self.record_id, "tenant")?,
            schema_name: parse_schema(self.schema_name)?,
            slug: self.slug,
            name: self.name,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            auto_create_schema: self.auto_create_schema,
            auto_drop_schema: self.auto_drop_schema,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

/// Public user row fetched through the membership edge.
#[derive(Debug, SurrealValue)]
struct MemberUserRow {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    status: String,
    is_verified: bool,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberUserRow {
    fn try_into_user(self) -> Result<PublicUser, DbError> {
        Ok(PublicUser {
            id: parse_uuid(&self.record_id, "public user")?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            is_verified: self.is_verified,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Tenant user row re-read after a transactional create.
#[derive(Debug, SurrealValue)]
struct LinkedTenantUserRow {
    schema_name: String,
    username: String,
    email: String,
    password_hash: String,
    status: String,
    is_verified: bool,
    is_staff: bool,
    is_superuser: bool,
    groups: Vec<String>,
    supervisor_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LinkedTenantUserRow {
    fn into_user(self, id: Uuid) -> Result<TenantUser, DbError> {
        let supervisor_id = match self.supervisor_id {
            Some(raw) => Some(parse_uuid(&raw, "supervisor")?),
            None => None,
        };
        Ok(TenantUser {
            id,
            schema_name: parse_schema(self.schema_name)?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            is_verified: self.is_verified,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            groups: self.groups,
            supervisor_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn is_linked(&self, user_id: Uuid, tenant_id: Uuid) -> TenantryResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member_of \
                 WHERE in = type::record('public_user', $user_id) \
                 AND out = type::record('tenant', $tenant_id) GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn tenants_of(&self, user_id: Uuid) -> TenantryResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('public_user', $user_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberTenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn users_of(&self, tenant_id: Uuid) -> TenantryResult<Vec<PublicUser>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM public_user \
                 WHERE id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('tenant', $tenant_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberUserRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn link_new_tenant_user(
        &self,
        schema: &SchemaName,
        tenant_id: Uuid,
        user_id: Uuid,
        input: CreateTenantUser,
    ) -> TenantryResult<TenantUser> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let user_id_str = user_id.to_string();
        let tenant_id_str = tenant_id.to_string();

        // RELATE requires literal record-id syntax, so we embed UUIDs
        // directly in the RELATE portion (they are safe — UUID format).
        let query = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('tenant_user', $id) SET \
             schema_name = $schema_name, \
             username = $username, email = $email, \
             password_hash = $password_hash, \
             status = 'Active', \
             is_verified = $is_verified, \
             is_staff = $is_staff, \
             is_superuser = $is_superuser, \
             groups = [], \
             supervisor_id = $supervisor_id; \
             RELATE public_user:`{user_id_str}` \
             -> member_of -> tenant:`{tenant_id_str}`; \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("schema_name", schema.as_str().to_string()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("is_verified", input.is_verified))
            .bind(("is_staff", input.is_staff))
            .bind(("is_superuser", input.is_superuser))
            .bind((
                "supervisor_id",
                input.supervisor_id.map(|id| id.to_string()),
            ))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        // Re-read after commit; statement results inside a transaction
        // are not relied upon.
        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant_user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LinkedTenantUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn link_existing_tenant_user(
        &self,
        schema: &SchemaName,
        tenant_id: Uuid,
        user_id: Uuid,
        tenant_user_id: Uuid,
    ) -> TenantryResult<()> {
        let user_id_str = user_id.to_string();
        let tenant_id_str = tenant_id.to_string();

        let query = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('tenant_user', $tenant_user_id) SET \
             supervisor_id = $supervisor_id, updated_at = time::now() \
             WHERE schema_name = $schema_name; \
             RELATE public_user:`{user_id_str}` \
             -> member_of -> tenant:`{tenant_id_str}`; \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("tenant_user_id", tenant_user_id.to_string()))
            .bind(("supervisor_id", user_id_str.clone()))
            .bind(("schema_name", schema.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn unlink(
        &self,
        schema: &SchemaName,
        tenant_id: Uuid,
        user_id: Uuid,
        tenant_user_id: Option<Uuid>,
        hard: bool,
    ) -> TenantryResult<()> {
        let edge_delete = "DELETE member_of \
             WHERE in = type::record('public_user', $user_id) \
             AND out = type::record('tenant', $tenant_id);";

        let tenant_user_update = match (tenant_user_id, hard) {
            (None, _) => "",
            (Some(_), false) => {
                "UPDATE type::record('tenant_user', $tenant_user_id) SET \
                 supervisor_id = NONE, updated_at = time::now() \
                 WHERE schema_name = $schema_name;"
            }
            (Some(_), true) => {
                "UPDATE type::record('tenant_user', $tenant_user_id) SET \
                 supervisor_id = NONE, groups = [], status = 'Inactive', \
                 updated_at = time::now() \
                 WHERE schema_name = $schema_name;"
            }
        };

        let query =
            format!("BEGIN TRANSACTION; {edge_delete} {tenant_user_update} COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("schema_name", schema.as_str().to_string()));

        if let Some(tenant_user_id) = tenant_user_id {
            builder = builder.bind(("tenant_user_id", tenant_user_id.to_string()));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
