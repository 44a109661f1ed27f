//! SurrealDB implementation of [`PublicUserRepository`].
//!
//! Passwords arrive pre-hashed; all hashing lives in `tenantry-auth`.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::public_user::{CreatePublicUser, PublicUser, UpdatePublicUser};
use tenantry_core::repository::PublicUserRepository;
use uuid::Uuid;

use super::{parse_status, parse_uuid, status_to_string};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PublicUserRow {
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

impl PublicUserRow {
    fn into_user(self, id: Uuid) -> Result<PublicUser, DbError> {
        Ok(PublicUser {
            id,
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

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PublicUserRowWithId {
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

impl PublicUserRowWithId {
    fn try_into_user(self) -> Result<PublicUser, DbError> {
        let id = parse_uuid(&self.record_id, "public user")?;
        Ok(PublicUser {
            id,
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

/// SurrealDB implementation of the PublicUser repository.
#[derive(Clone)]
pub struct SurrealPublicUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPublicUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PublicUserRepository for SurrealPublicUserRepository<C> {
    async fn create(&self, input: CreatePublicUser) -> TenantryResult<PublicUser> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('public_user', $id) SET \
                 username = $username, email = $email, \
                 password_hash = $password_hash, \
                 status = 'Active', \
                 is_verified = $is_verified, \
                 is_staff = $is_staff, \
                 is_superuser = $is_superuser",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("is_verified", input.is_verified))
            .bind(("is_staff", input.is_staff))
            .bind(("is_superuser", input.is_superuser))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PublicUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "public_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TenantryResult<PublicUser> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('public_user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PublicUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "public_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> TenantryResult<PublicUser> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM public_user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PublicUserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "public_user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePublicUser) -> TenantryResult<PublicUser> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
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
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('public_user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
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

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PublicUserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "public_user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }
}
