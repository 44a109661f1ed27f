//! Explicit schema handles.
//!
//! Every tenant-scoped repository call takes a [`SchemaName`] value.
//! There is no implicit "current schema" connection state anywhere in
//! the system, so nothing ever needs saving or restoring across calls.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TenantryError, TenantryResult};

/// A validated schema identifier naming one tenant's isolated slice of
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a schema identifier.
    ///
    /// Accepts lowercase ASCII letters, digits and underscores, not
    /// starting with a digit — the safe common subset of SQL schema
    /// identifiers, so slugs survive a move to any backing store.
    pub fn new(name: impl Into<String>) -> TenantryResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
        let valid_rest =
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if name.is_empty() || !valid_start || !valid_rest {
            return Err(TenantryError::Validation {
                message: format!("invalid schema name: {name:?}"),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slug_with_timestamp_suffix() {
        assert!(SchemaName::new("acme_1700000000").is_ok());
    }

    #[test]
    fn rejects_leading_digit_and_bad_chars() {
        assert!(SchemaName::new("1acme").is_err());
        assert!(SchemaName::new("acme-corp").is_err());
        assert!(SchemaName::new("Acme").is_err());
        assert!(SchemaName::new("").is_err());
    }
}
