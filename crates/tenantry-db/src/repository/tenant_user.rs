//! SurrealDB implementation of [`TenantUserRepository`].
//!
//! Every query filters on the explicit schema handle; a tenant user is
//! invisible outside its own schema.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::tenant_user::{CreateTenantUser, TenantUser, UpdateTenantUser};
use tenantry_core::repository::TenantUserRepository;
use tenantry_core::schema::SchemaName;
use uuid::Uuid;

use super::{parse_schema, parse_status, parse_uuid, status_to_string};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantUserRow {
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

impl TenantUserRow {
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

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantUserRowWithId {
    record_id: String,
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

impl TenantUserRowWithId {
    fn try_into_user(self) -> Result<TenantUser, DbError> {
        let id = parse_uuid(&self.record_id, "tenant user")?;
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

/// SurrealDB implementation of the TenantUser repository.
#[derive(Clone)]
pub struct SurrealTenantUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantUserRepository for SurrealTenantUserRepository<C> {
    async fn create(
        &self,
        schema: &SchemaName,
        input: CreateTenantUser,
    ) -> TenantryResult<TenantUser> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant_user', $id) SET \
                 schema_name = $schema_name, \
                 username = $username, email = $email, \
                 password_hash = $password_hash, \
                 status = 'Active', \
                 is_verified = $is_verified, \
                 is_staff = $is_staff, \
                 is_superuser = $is_superuser, \
                 groups = [], \
                 supervisor_id = $supervisor_id",
            )
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
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, schema: &SchemaName, id: Uuid) -> TenantryResult<TenantUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('tenant_user', $id) \
                 WHERE schema_name = $schema_name",
            )
            .bind(("id", id_str.clone()))
            .bind(("schema_name", schema.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, schema: &SchemaName, email: &str) -> TenantryResult<TenantUser> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant_user \
                 WHERE schema_name = $schema_name AND email = $email",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantUserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_supervisor(
        &self,
        schema: &SchemaName,
        supervisor_id: Uuid,
    ) -> TenantryResult<TenantUser> {
        let supervisor_str = supervisor_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant_user \
                 WHERE schema_name = $schema_name \
                 AND supervisor_id = $supervisor_id",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .bind(("supervisor_id", supervisor_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantUserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_user".into(),
            id: format!("supervisor={supervisor_str}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(
        &self,
        schema: &SchemaName,
        id: Uuid,
        input: UpdateTenantUser,
    ) -> TenantryResult<TenantUser> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.is_verified.is_some() {
            sets.push("is_verified = $is_verified");
        }
        if input.is_staff.is_some() {
            sets.push("is_staff = $is_staff");
        }
        if input.is_superuser.is_some() {
            sets.push("is_superuser = $is_superuser");
        }
        if input.groups.is_some() {
            sets.push("groups = $groups");
        }
        if input.supervisor_id.is_some() {
            sets.push("supervisor_id = $supervisor_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('tenant_user', $id) SET {} \
             WHERE schema_name = $schema_name",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("schema_name", schema.as_str().to_string()));

        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(is_verified) = input.is_verified {
            builder = builder.bind(("is_verified", is_verified));
        }
        if let Some(is_staff) = input.is_staff {
            builder = builder.bind(("is_staff", is_staff));
        }
        if let Some(is_superuser) = input.is_superuser {
            builder = builder.bind(("is_superuser", is_superuser));
        }
        if let Some(groups) = input.groups {
            builder = builder.bind(("groups", groups));
        }
        if let Some(supervisor_id) = input.supervisor_id {
            // Option<Option<Uuid>>: Some(Some(v)) = set, Some(None) = clear.
            builder = builder.bind(("supervisor_id", supervisor_id.map(|id| id.to_string())));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }
}
