//! SurrealDB implementation of [`DomainRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::domain::{CreateDomain, Domain};
use tenantry_core::repository::DomainRepository;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct DomainRow {
    domain: String,
    tenant_id: String,
    is_primary: bool,
    created_at: DateTime<Utc>,
}

impl DomainRow {
    fn into_domain(self, id: Uuid) -> Result<Domain, DbError> {
        Ok(Domain {
            id,
            domain: self.domain,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            is_primary: self.is_primary,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DomainRowWithId {
    record_id: String,
    domain: String,
    tenant_id: String,
    is_primary: bool,
    created_at: DateTime<Utc>,
}

impl DomainRowWithId {
    fn try_into_domain(self) -> Result<Domain, DbError> {
        let id = parse_uuid(&self.record_id, "domain")?;
        Ok(Domain {
            id,
            domain: self.domain,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            is_primary: self.is_primary,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Domain repository.
#[derive(Clone)]
pub struct SurrealDomainRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDomainRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DomainRepository for SurrealDomainRepository<C> {
    async fn create(&self, input: CreateDomain) -> TenantryResult<Domain> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('domain', $id) SET \
                 domain = $domain, tenant_id = $tenant_id, \
                 is_primary = $is_primary",
            )
            .bind(("id", id_str.clone()))
            .bind(("domain", input.domain))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("is_primary", input.is_primary))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DomainRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "domain".into(),
            id: id_str,
        })?;

        Ok(row.into_domain(id)?)
    }

    async fn get_by_domain(&self, domain: &str) -> TenantryResult<Domain> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM domain \
                 WHERE domain = $domain",
            )
            .bind(("domain", domain.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DomainRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "domain".into(),
            id: format!("domain={domain}"),
        })?;

        Ok(row.try_into_domain()?)
    }

    async fn primary_for(&self, tenant_id: Uuid) -> TenantryResult<Domain> {
        let tenant_id_str = tenant_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM domain \
                 WHERE tenant_id = $tenant_id AND is_primary = true",
            )
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DomainRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "domain".into(),
            id: format!("tenant={tenant_id_str}"),
        })?;

        Ok(row.try_into_domain()?)
    }

    async fn rename(&self, id: Uuid, new_domain: &str) -> TenantryResult<Domain> {
        let id_str = id.to_string();

        let result = self
            .db
            .query("UPDATE type::record('domain', $id) SET domain = $domain")
            .bind(("id", id_str.clone()))
            .bind(("domain", new_domain.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DomainRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "domain".into(),
            id: id_str,
        })?;

        Ok(row.into_domain(id)?)
    }

    async fn delete(&self, id: Uuid) -> TenantryResult<()> {
        self.db
            .query("DELETE type::record('domain', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
