//! Domain models for tenantry.
//!
//! These are the core types shared across all crates.

pub mod domain;
pub mod public_user;
pub mod session;
pub mod tenant;
pub mod tenant_user;

use serde::{Deserialize, Serialize};

/// Soft-delete status shared by both user kinds.
///
/// Rows are never physically removed — deactivation preserves history
/// while an inactive row can be revived by a later create with the
/// same identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn is_active(self) -> bool {
        matches!(self, UserStatus::Active)
    }
}
