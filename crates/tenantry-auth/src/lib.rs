//! Schema-aware authentication: password hashing, credential
//! verification and session resolution for the tenancy service.

pub mod backend;
pub mod config;
pub mod error;
pub mod password;
pub mod session;
pub mod token;

pub use backend::CredentialBackend;
pub use config::AuthConfig;
pub use error::AuthError;
pub use session::{ResolvedUser, SessionResolver, session_auth_hash};
