//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::session::{CreateSessionRecord, SessionRecord};
use tenantry_core::repository::SessionRepository;
use tenantry_core::schema::SchemaName;
use uuid::Uuid;

use super::{CountRow, parse_schema, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    schema_name: String,
    user_id: String,
    token_hash: String,
    auth_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<SessionRecord, DbError> {
        Ok(SessionRecord {
            id,
            schema_name: parse_schema(self.schema_name)?,
            user_id: parse_uuid(&self.user_id, "user")?,
            token_hash: self.token_hash,
            auth_hash: self.auth_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    schema_name: String,
    user_id: String,
    token_hash: String,
    auth_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<SessionRecord, DbError> {
        let id = parse_uuid(&self.record_id, "session")?;
        Ok(SessionRecord {
            id,
            schema_name: parse_schema(self.schema_name)?,
            user_id: parse_uuid(&self.user_id, "user")?,
            token_hash: self.token_hash,
            auth_hash: self.auth_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSessionRecord) -> TenantryResult<SessionRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 schema_name = $schema_name, \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 auth_hash = $auth_hash, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("schema_name", input.schema_name.as_str().to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("auth_hash", input.auth_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        Ok(row.into_session(id)?)
    }

    async fn get_by_token_hash(
        &self,
        schema: &SchemaName,
        token_hash: &str,
    ) -> TenantryResult<SessionRecord> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE schema_name = $schema_name \
                 AND token_hash = $token_hash",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "token".into(),
        })?;

        Ok(row.try_into_session()?)
    }

    async fn delete(&self, schema: &SchemaName, id: Uuid) -> TenantryResult<()> {
        self.db
            .query(
                "DELETE type::record('session', $id) \
                 WHERE schema_name = $schema_name",
            )
            .bind(("id", id.to_string()))
            .bind(("schema_name", schema.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn invalidate_user_sessions(
        &self,
        schema: &SchemaName,
        user_id: Uuid,
    ) -> TenantryResult<()> {
        self.db
            .query(
                "DELETE session \
                 WHERE schema_name = $schema_name AND user_id = $user_id",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn cleanup_expired(&self, schema: &SchemaName) -> TenantryResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM session \
                 WHERE schema_name = $schema_name \
                 AND expires_at <= time::now() GROUP ALL",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(
                "DELETE session \
                 WHERE schema_name = $schema_name \
                 AND expires_at <= time::now()",
            )
            .bind(("schema_name", schema.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
