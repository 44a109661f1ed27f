//! Schema-aware session resolution.
//!
//! Sessions carry an auth hash — an HMAC over the user's password hash
//! at login time. On every tenant-schema resolution the hash is
//! recomputed from the freshly loaded user and compared in constant
//! time; a mismatch (password changed, session forged) flushes the
//! session. The public schema resolves through the plain global
//! mechanism with no hash dance.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tenantry_core::config::TenancyConfig;
use tenantry_core::error::TenantryResult;
use tenantry_core::models::public_user::PublicUser;
use tenantry_core::models::session::{CreateSessionRecord, SessionRecord};
use tenantry_core::models::tenant_user::TenantUser;
use tenantry_core::repository::{PublicUserRepository, SessionRepository, TenantUserRepository};
use tenantry_core::schema::SchemaName;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token;

type HmacSha256 = Hmac<Sha256>;

/// Domain separation label for the session auth-hash HMAC key.
const AUTH_HASH_LABEL: &[u8] = b"tenantry.auth.session";

/// The user resolved for a request, or the anonymous sentinel.
#[derive(Debug, Clone)]
pub enum ResolvedUser {
    Public(PublicUser),
    Tenant(TenantUser),
    Anonymous,
}

impl ResolvedUser {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, ResolvedUser::Anonymous)
    }
}

/// Compute the session auth hash for a password hash.
///
/// HMAC-SHA256 keyed with the server secret plus a fixed label,
/// base64-encoded. Changing the password changes the result, which is
/// what invalidates outstanding sessions.
pub fn session_auth_hash(password_hash: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let mut key = config.secret_key.as_bytes().to_vec();
    key.extend_from_slice(AUTH_HASH_LABEL);

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| AuthError::Crypto(format!("hmac key error: {e}")))?;
    mac.update(password_hash.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of a stored auth hash against the value
/// recomputed from the user's current password hash.
fn verify_auth_hash(
    password_hash: &str,
    stored: &str,
    config: &AuthConfig,
) -> Result<bool, AuthError> {
    let decoded = match STANDARD.decode(stored) {
        Ok(bytes) => bytes,
        // A stored hash that does not even decode can never match.
        Err(_) => return Ok(false),
    };

    let mut key = config.secret_key.as_bytes().to_vec();
    key.extend_from_slice(AUTH_HASH_LABEL);

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| AuthError::Crypto(format!("hmac key error: {e}")))?;
    mac.update(password_hash.as_bytes());

    // Mac::verify_slice is constant-time.
    Ok(mac.verify_slice(&decoded).is_ok())
}

/// Schema-aware session store front-end.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct SessionResolver<P, T, S>
where
    P: PublicUserRepository,
    T: TenantUserRepository,
    S: SessionRepository,
{
    public_users: P,
    tenant_users: T,
    sessions: S,
    config: AuthConfig,
    tenancy: TenancyConfig,
}

impl<P, T, S> SessionResolver<P, T, S>
where
    P: PublicUserRepository,
    T: TenantUserRepository,
    S: SessionRepository,
{
    pub fn new(
        public_users: P,
        tenant_users: T,
        sessions: S,
        config: AuthConfig,
        tenancy: TenancyConfig,
    ) -> Self {
        Self {
            public_users,
            tenant_users,
            sessions,
            config,
            tenancy,
        }
    }

    /// Open a session for an already-authenticated user.
    ///
    /// Returns the stored record together with the raw opaque token to
    /// hand to the client (only its hash is persisted).
    pub async fn open_session(
        &self,
        schema: &SchemaName,
        user_id: Uuid,
        password_hash: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> TenantryResult<(SessionRecord, String)> {
        let raw_token = token::generate_session_token();
        let token_hash = token::hash_session_token(&raw_token);
        let auth_hash = session_auth_hash(password_hash, &self.config)?;
        let expires_at = Utc::now() + Duration::seconds(self.config.session_lifetime_secs as i64);

        let session = self
            .sessions
            .create(CreateSessionRecord {
                schema_name: schema.clone(),
                user_id,
                token_hash,
                auth_hash,
                ip_address,
                user_agent,
                expires_at,
            })
            .await?;

        Ok((session, raw_token))
    }

    /// Resolve the user behind a raw session token for the active
    /// schema. Returns [`ResolvedUser::Anonymous`] when no valid
    /// session exists.
    pub async fn resolve_user(
        &self,
        schema: &SchemaName,
        raw_token: &str,
    ) -> TenantryResult<ResolvedUser> {
        let token_hash = token::hash_session_token(raw_token);

        let session = match self.sessions.get_by_token_hash(schema, &token_hash).await {
            Ok(session) => session,
            Err(e) if e.is_not_found() => return Ok(ResolvedUser::Anonymous),
            Err(e) => return Err(e),
        };

        if session.expires_at <= Utc::now() {
            self.sessions.delete(schema, session.id).await?;
            return Ok(ResolvedUser::Anonymous);
        }

        if self.tenancy.is_public_schema(schema) {
            return self.resolve_public(session).await;
        }
        self.resolve_tenant(schema, session).await
    }

    async fn resolve_public(&self, session: SessionRecord) -> TenantryResult<ResolvedUser> {
        match self.public_users.get_by_id(session.user_id).await {
            Ok(user) if user.is_active() => Ok(ResolvedUser::Public(user)),
            Ok(_) => Ok(ResolvedUser::Anonymous),
            Err(e) if e.is_not_found() => Ok(ResolvedUser::Anonymous),
            Err(e) => Err(e),
        }
    }

    async fn resolve_tenant(
        &self,
        schema: &SchemaName,
        session: SessionRecord,
    ) -> TenantryResult<ResolvedUser> {
        let user = match self.tenant_users.get_by_id(schema, session.user_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Ok(ResolvedUser::Anonymous),
            Err(e) => return Err(e),
        };

        let verified = verify_auth_hash(&user.password_hash, &session.auth_hash, &self.config)?;
        if !verified {
            // The password changed (or the session is forged); flush it.
            debug!(schema = %schema, "session auth hash mismatch, flushing session");
            self.sessions.delete(schema, session.id).await?;
            return Ok(ResolvedUser::Anonymous);
        }

        if !user.is_active() {
            return Ok(ResolvedUser::Anonymous);
        }

        Ok(ResolvedUser::Tenant(user))
    }

    /// Invalidate a single session (logout).
    pub async fn close_session(&self, schema: &SchemaName, session_id: Uuid) -> TenantryResult<()> {
        self.sessions.delete(schema, session_id).await
    }

    /// Revoke all sessions for a user (e.g. on password change).
    pub async fn revoke_all_sessions(
        &self,
        schema: &SchemaName,
        user_id: Uuid,
    ) -> TenantryResult<()> {
        self.sessions.invalidate_user_sessions(schema, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            secret_key: "test-secret".into(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn auth_hash_is_deterministic_per_password_hash() {
        let cfg = config();
        let a = session_auth_hash("phc-hash-a", &cfg).unwrap();
        let b = session_auth_hash("phc-hash-a", &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn auth_hash_changes_with_password_hash() {
        let cfg = config();
        let a = session_auth_hash("phc-hash-a", &cfg).unwrap();
        let b = session_auth_hash("phc-hash-b", &cfg).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_accepts_matching_hash() {
        let cfg = config();
        let stored = session_auth_hash("phc-hash-a", &cfg).unwrap();
        assert!(verify_auth_hash("phc-hash-a", &stored, &cfg).unwrap());
    }

    #[test]
    fn verify_rejects_stale_hash_and_garbage() {
        let cfg = config();
        let stored = session_auth_hash("phc-hash-a", &cfg).unwrap();
        assert!(!verify_auth_hash("phc-hash-b", &stored, &cfg).unwrap());
        assert!(!verify_auth_hash("phc-hash-a", "not base64 ???", &cfg).unwrap());
    }
}
