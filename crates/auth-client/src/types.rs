//! Wire types for the auth endpoints.
//!
//! Field naming follows the backend's JSON convention (camelCase).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Login request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Plaintext password, sent over TLS only.
    pub password: String,
}

impl Credentials {
    /// Create a new credentials pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account identity as returned by login and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Unique username.
    pub username: String,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Server deployment mode.
///
/// `solo` installations enforce the single-user session policy (heartbeat
/// and inactivity locking); `shared` installations leave session policing to
/// the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    Solo,
    Shared,
}

impl std::fmt::Display for DeployMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployMode::Solo => write!(f, "solo"),
            DeployMode::Shared => write!(f, "shared"),
        }
    }
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserAccount,
    pub mode: DeployMode,
}

/// Successful `/auth/me` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user: UserAccount,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub mode: DeployMode,
}

/// Rotated token pair from a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a refresh attempt.
///
/// Refresh never surfaces an error; callers only learn whether they hold a
/// fresh pair or not, and decide themselves what a failure means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The server issued a rotated pair.
    Refreshed(RefreshedTokens),
    /// Rejected or unreachable; details are in the logs.
    Failed,
}

impl RefreshOutcome {
    /// Returns true if a rotated pair was issued.
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed(_))
    }
}
