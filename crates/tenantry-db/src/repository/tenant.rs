//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::tenant::{CreateTenant, Tenant};
use tenantry_core::repository::TenantRepository;
use tenantry_core::schema::SchemaName;
use uuid::Uuid;

use super::{parse_schema, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    schema_name: String,
    slug: String,
    name: String,
    owner_id: String,
    auto_create_schema: bool,
    auto_drop_schema: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
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

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
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

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = parse_uuid(&self.record_id, "tenant")?;
        Ok(Tenant {
            id,
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

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> TenantryResult<Tenant> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 schema_name = $schema_name, \
                 slug = $slug, name = $name, \
                 owner_id = $owner_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("schema_name", input.schema_name.as_str().to_string()))
            .bind(("slug", input.slug))
            .bind(("name", input.name))
            .bind(("owner_id", input.owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TenantryResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_schema(&self, schema: &SchemaName) -> TenantryResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE schema_name = $schema_name",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("schema={schema}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_slug(&self, slug: &str) -> TenantryResult<Tenant> {
        // Retired tenants keep their slug; prefer the newest match.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE slug = $slug \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn set_owner(&self, id: Uuid, owner_id: Uuid) -> TenantryResult<Tenant> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 owner_id = $owner_id, modified_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn delete(&self, id: Uuid) -> TenantryResult<()> {
        self.db
            .query("DELETE type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
