//! Token persistence for the Opsdesk client session.
//!
//! This crate owns the shape of the persisted session credentials and the
//! `TokenStore` port the session lifecycle writes through:
//! - **`MemoryTokenStore`**: process-local, for tests and embedders that
//!   manage persistence themselves
//! - **`FileTokenStore`**: a single JSON document written atomically
//!
//! Access and refresh tokens are a pair. They are stored together, replaced
//! together, and cleared together; no backend can expose one without the
//! other.

mod file;
mod keys;
mod memory;
mod traits;

pub use file::FileTokenStore;
pub use keys::StorageKeys;
pub use memory::MemoryTokenStore;
pub use traits::{TokenPair, TokenStore};

use thiserror::Error;

/// Error type for token store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for token store operations.
pub type StorageResult<T> = Result<T, StorageError>;
