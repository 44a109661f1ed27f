//! SurrealDB repository implementations for the `tenantry-core` traits.

mod domain;
mod membership;
mod public_user;
mod session;
mod tenant;
mod tenant_user;

pub use domain::SurrealDomainRepository;
pub use membership::SurrealMembershipRepository;
pub use public_user::SurrealPublicUserRepository;
pub use session::SurrealSessionRepository;
pub use tenant::SurrealTenantRepository;
pub use tenant_user::SurrealTenantUserRepository;

use surrealdb_types::SurrealValue;
use tenantry_core::models::UserStatus;
use tenantry_core::schema::SchemaName;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_status(s: &str) -> Result<UserStatus, DbError> {
    match s {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        other => Err(DbError::Query(format!("unknown user status: {other}"))),
    }
}

fn status_to_string(s: UserStatus) -> &'static str {
    match s {
        UserStatus::Active => "Active",
        UserStatus::Inactive => "Inactive",
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Query(format!("invalid {what} UUID: {e}")))
}

fn parse_schema(value: String) -> Result<SchemaName, DbError> {
    SchemaName::new(value).map_err(|e| DbError::Query(format!("invalid schema name: {e}")))
}
