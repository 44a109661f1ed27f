//! Table definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs and schema names are stored as strings. Statuses are stored
//! as strings with ASSERT constraints. Tenant-scoped tables carry a
//! `schema_name` field and composite unique indexes enforce per-schema
//! uniqueness.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (public scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD schema_name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD owner_id ON TABLE tenant TYPE string;
DEFINE FIELD auto_create_schema ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD auto_drop_schema ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_schema ON TABLE tenant \
    COLUMNS schema_name UNIQUE;

-- Slugs are deliberately NOT unique: retired tenants keep their slug
-- and the domain table guards against live collisions.

-- =======================================================================
-- Domains (public scope)
-- =======================================================================
DEFINE TABLE domain SCHEMAFULL;
DEFINE FIELD domain ON TABLE domain TYPE string;
DEFINE FIELD tenant_id ON TABLE domain TYPE string;
DEFINE FIELD is_primary ON TABLE domain TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE domain TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_domain_domain ON TABLE domain COLUMNS domain UNIQUE;
DEFINE INDEX idx_domain_tenant ON TABLE domain COLUMNS tenant_id;

-- =======================================================================
-- Public users (public scope)
-- =======================================================================
DEFINE TABLE public_user SCHEMAFULL;
DEFINE FIELD username ON TABLE public_user TYPE string;
DEFINE FIELD email ON TABLE public_user TYPE string;
DEFINE FIELD password_hash ON TABLE public_user TYPE string;
DEFINE FIELD status ON TABLE public_user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD is_verified ON TABLE public_user TYPE bool DEFAULT false;
DEFINE FIELD is_staff ON TABLE public_user TYPE bool DEFAULT false;
DEFINE FIELD is_superuser ON TABLE public_user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE public_user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE public_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_public_user_email ON TABLE public_user \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Tenant users (tenant scope)
-- =======================================================================
DEFINE TABLE tenant_user SCHEMAFULL;
DEFINE FIELD schema_name ON TABLE tenant_user TYPE string;
DEFINE FIELD username ON TABLE tenant_user TYPE string;
DEFINE FIELD email ON TABLE tenant_user TYPE string;
DEFINE FIELD password_hash ON TABLE tenant_user TYPE string;
DEFINE FIELD status ON TABLE tenant_user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD is_verified ON TABLE tenant_user TYPE bool DEFAULT false;
DEFINE FIELD is_staff ON TABLE tenant_user TYPE bool DEFAULT false;
DEFINE FIELD is_superuser ON TABLE tenant_user TYPE bool DEFAULT false;
DEFINE FIELD groups ON TABLE tenant_user TYPE array DEFAULT [];
DEFINE FIELD groups.* ON TABLE tenant_user TYPE string;
DEFINE FIELD supervisor_id ON TABLE tenant_user TYPE option<string>;
DEFINE FIELD created_at ON TABLE tenant_user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_user_email ON TABLE tenant_user \
    COLUMNS schema_name, email UNIQUE;
DEFINE INDEX idx_tenant_user_supervisor ON TABLE tenant_user \
    COLUMNS schema_name, supervisor_id;

-- =======================================================================
-- Sessions (per schema)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD schema_name ON TABLE session TYPE string;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD auth_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS schema_name, token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session \
    COLUMNS schema_name, user_id;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- PublicUser -> Tenant membership (the many-to-many join)
DEFINE TABLE member_of TYPE RELATION SCHEMAFULL;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
