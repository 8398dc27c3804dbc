//! Error Types
//!
//! The cache has a single failure mode: `replace` on a key that is not
//! present. Every other operation is total.

use thiserror::Error;

/// Returned by [`Cache::replace`](crate::Cache::replace) when the key does not exist.
///
/// The store is left unchanged. Callers that want upsert semantics can fall
/// back to [`Cache::set`](crate::Cache::set).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item {key} doesn't exist")]
pub struct NotFoundError {
    /// The key that was looked up
    pub key: String,
}

impl NotFoundError {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Returns the missing key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_key() {
        let err = NotFoundError::new("session:42");
        assert_eq!(err.to_string(), "item session:42 doesn't exist");
        assert_eq!(err.key(), "session:42");
    }
}
