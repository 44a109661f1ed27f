//! Connection handling for the shared tenant store.
//!
//! Every schema lives inside one SurrealDB database; this module owns
//! the root connection that all repositories clone.

use std::env;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Connection settings for the tenant store.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, host and port only (e.g. `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "tenantry".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build the configuration from `TENANTRY_DB_*` environment
    /// variables, falling back to the defaults for any that are unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env_or("TENANTRY_DB_URL", defaults.url),
            namespace: env_or("TENANTRY_DB_NAMESPACE", defaults.namespace),
            database: env_or("TENANTRY_DB_DATABASE", defaults.database),
            username: env_or("TENANTRY_DB_USERNAME", defaults.username),
            password: env_or("TENANTRY_DB_PASSWORD", defaults.password),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

/// Owns the root SurrealDB client shared by every repository.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the tenant store: sign in as root and select the
    /// configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "opening tenant store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("tenant store ready");

        Ok(Self { db })
    }

    /// The underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
