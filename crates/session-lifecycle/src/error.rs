//! Error types for the session lifecycle.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session is not locked")]
    NotLocked,

    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Auth error: {0}")]
    Auth(#[from] auth_client::AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] session_storage::StorageError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
