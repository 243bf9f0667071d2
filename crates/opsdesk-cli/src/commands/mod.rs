//! CLI command implementations.

mod auth;
mod config;
mod watch;

pub use auth::{login, logout, status};
pub use config::config;
pub use watch::watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use auth_client::AuthClient;
use session_lifecycle::SessionManager;
use session_storage::{FileTokenStore, TokenStore};

/// Where the token pair lives on disk unless `--token-file` says otherwise.
fn default_token_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".opsdesk").join("tokens.json"))
}

/// Build a session manager wired to the given server.
pub fn build_manager(api_url: &str, token_file: Option<&Path>) -> Result<Arc<SessionManager>> {
    let token_path = match token_file {
        Some(path) => path.to_path_buf(),
        None => default_token_path()?,
    };
    let client = Arc::new(AuthClient::new(api_url));
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(token_path));
    let manager = Arc::new(SessionManager::new(client, store));
    manager.start();
    Ok(manager)
}
