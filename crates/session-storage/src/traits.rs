//! Token store trait and the credential pair it carries.

use crate::StorageResult;
use serde::{Deserialize, Serialize};

/// The persisted session credentials.
///
/// Serialized field names are the fixed storage keys
/// (`auth_access_token` / `auth_refresh_token`), see
/// [`StorageKeys`](crate::StorageKeys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token sent with authenticated requests.
    #[serde(rename = "auth_access_token")]
    pub access_token: String,

    /// Long-lived token used to obtain a fresh pair.
    #[serde(rename = "auth_refresh_token")]
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a new token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Trait for token persistence backends.
///
/// The pair is the unit of storage: `load` never yields half a pair, and
/// `store`/`clear` replace or remove both tokens in one step.
pub trait TokenStore: Send + Sync {
    /// Read the persisted pair, if any.
    fn load(&self) -> StorageResult<Option<TokenPair>>;

    /// Replace the persisted pair.
    fn store(&self, pair: &TokenPair) -> StorageResult<()>;

    /// Remove the persisted pair. Clearing an empty store is not an error.
    fn clear(&self) -> StorageResult<()>;

    /// Check whether a pair is persisted.
    fn has_tokens(&self) -> StorageResult<bool> {
        Ok(self.load()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryTokenStore;

    #[test]
    fn test_has_tokens_default_method() {
        let store = MemoryTokenStore::new();
        assert!(!store.has_tokens().unwrap());

        store.store(&TokenPair::new("a", "r")).unwrap();
        assert!(store.has_tokens().unwrap());
    }
}
