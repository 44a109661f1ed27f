//! Tenantry Core — domain models, repository traits, lifecycle events
//! and tenancy configuration shared across all crates.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod repository;
pub mod schema;

pub use config::TenancyConfig;
pub use error::{TenantryError, TenantryResult};
pub use events::{EventBus, LifecycleEvent};
pub use schema::SchemaName;
