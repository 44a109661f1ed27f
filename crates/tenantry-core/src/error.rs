//! Error types for the tenantry system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantryError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Inactive: {reason}")]
    Inactive { reason: String },

    #[error("Delete forbidden: {reason}")]
    DeleteForbidden { reason: String },

    #[error("Schema violation: {reason}")]
    SchemaViolation { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TenantryError {
    /// True when the error is the not-found kind, regardless of entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TenantryError::NotFound { .. })
    }
}

pub type TenantryResult<T> = Result<T, TenantryError>;
