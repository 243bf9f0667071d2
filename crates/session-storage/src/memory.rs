//! In-memory token store.

use crate::{StorageResult, TokenPair, TokenStore};
use std::sync::Mutex;

/// Process-local token store.
///
/// Nothing survives the process. Used by tests and by embedders that keep
/// credentials in their own storage layer.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StorageResult<Option<TokenPair>> {
        Ok(self.tokens.lock().unwrap().clone())
    }

    fn store(&self, pair: &TokenPair) -> StorageResult<()> {
        *self.tokens.lock().unwrap() = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.tokens.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_none() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_store_and_load() {
        let store = MemoryTokenStore::new();
        let pair = TokenPair::new("acc", "ref");

        store.store(&pair).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair));
    }

    #[test]
    fn test_store_replaces_previous_pair() {
        let store = MemoryTokenStore::new();
        store.store(&TokenPair::new("old-acc", "old-ref")).unwrap();
        store.store(&TokenPair::new("new-acc", "new-ref")).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "new-acc");
        assert_eq!(loaded.refresh_token, "new-ref");
    }

    #[test]
    fn test_clear_removes_pair() {
        let store = MemoryTokenStore::new();
        store.store(&TokenPair::new("acc", "ref")).unwrap();

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_clear_on_empty_store_is_ok() {
        let store = MemoryTokenStore::new();
        assert!(store.clear().is_ok());
    }
}
