//! Tenantry Server — application entry point.
//!
//! Reads configuration from the environment, connects to SurrealDB,
//! applies pending migrations and, when bootstrap settings are
//! present, creates the public tenant on first run.

use std::env;
use std::process::ExitCode;

use tenantry_auth::AuthConfig;
use tenantry_core::config::TenancyConfig;
use tenantry_core::events::EventBus;
use tenantry_db::repository::{
    SurrealDomainRepository, SurrealMembershipRepository, SurrealPublicUserRepository,
    SurrealTenantRepository, SurrealTenantUserRepository,
};
use tenantry_db::{DbConfig, DbManager, run_migrations};
use tenantry_lifecycle::TenantService;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn tenancy_config_from_env() -> TenancyConfig {
    let defaults = TenancyConfig::default();
    TenancyConfig {
        public_schema_name: env_or("TENANTRY_PUBLIC_SCHEMA", &defaults.public_schema_name),
        base_domain: env_or("TENANTRY_BASE_DOMAIN", &defaults.base_domain),
    }
}

fn auth_config_from_env() -> AuthConfig {
    let defaults = AuthConfig::default();
    AuthConfig {
        secret_key: env_or("TENANTRY_SECRET_KEY", ""),
        pepper: env::var("TENANTRY_PEPPER").ok(),
        session_lifetime_secs: env::var("TENANTRY_SESSION_LIFETIME_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.session_lifetime_secs),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    info!("Starting Tenantry server...");

    match run().await {
        Ok(()) => {
            info!("Tenantry server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DbConfig::from_env();
    let tenancy = tenancy_config_from_env();
    let auth = auth_config_from_env();
    if auth.secret_key.is_empty() {
        return Err("TENANTRY_SECRET_KEY must be set".into());
    }

    let manager = DbManager::connect(&db_config).await?;
    let db = manager.client().clone();
    run_migrations(&db).await?;

    let events = EventBus::default();
    let tenant_service = TenantService::new(
        SurrealTenantRepository::new(db.clone()),
        SurrealDomainRepository::new(db.clone()),
        SurrealPublicUserRepository::new(db.clone()),
        SurrealTenantUserRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
        events.clone(),
        tenancy.clone(),
        auth.clone(),
    );

    // First-run bootstrap of the public tenant, driven by env.
    if let (Ok(domain), Ok(owner_email)) = (
        env::var("TENANTRY_BOOTSTRAP_DOMAIN"),
        env::var("TENANTRY_BOOTSTRAP_OWNER_EMAIL"),
    ) {
        let owner_username = env_or("TENANTRY_BOOTSTRAP_OWNER_USERNAME", "admin");
        let public_schema = tenancy.public_schema()?;
        match tenant_service.tenant_by_schema(&public_schema).await {
            Ok(_) => info!("public tenant already present, skipping bootstrap"),
            Err(e) if e.is_not_found() => {
                tenant_service
                    .create_public_tenant(&domain, &owner_email, &owner_username)
                    .await?;
                info!(domain = %domain, "public tenant bootstrapped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Tenantry server ready.");
    tokio::signal::ctrl_c().await?;
    Ok(())
}
