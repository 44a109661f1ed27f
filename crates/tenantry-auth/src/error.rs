//! Authentication error types.
//!
//! Credential rejections are never errors here: the backend reports
//! them as `Ok(None)` so callers cannot leak why a login failed. Only
//! genuine cryptography failures surface as `AuthError`.

use tenantry_core::error::TenantryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for TenantryError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => TenantryError::Crypto(msg),
        }
    }
}
