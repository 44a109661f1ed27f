//! Tenant and user lifecycle services.
//!
//! The services are generic over the repository traits defined in
//! `tenantry-core`, so they run unchanged against the SurrealDB
//! implementations or test doubles.

pub mod tenants;
pub mod users;

pub use tenants::TenantService;
pub use users::{NewUser, UserService};
