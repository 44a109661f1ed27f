//! Authentication configuration.

/// Configuration for the authentication layer.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Server-side secret keying the session auth-hash HMAC.
    pub secret_key: String,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Session lifetime in seconds (default: 1_209_600 = 14 days).
    pub session_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            pepper: None,
            session_lifetime_secs: 1_209_600,
        }
    }
}
