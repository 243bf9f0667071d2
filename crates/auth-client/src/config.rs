//! Server-declared session timing policy.

use crate::AuthClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Session timing policy.
///
/// Fetched from `/api/v1/auth/session-config` before any timer is armed.
/// The defaults below are the hard-coded fallback used whenever the fetch
/// fails; a missing field in the server response also falls back per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Access token lifetime the server issues.
    pub access_token_expiry_minutes: u64,
    /// Refresh token lifetime the server issues.
    pub refresh_token_expiry_days: u64,
    /// Idle time after which a solo session locks.
    pub inactivity_timeout_minutes: u64,
    /// Sessions the server allows concurrently.
    pub max_concurrent_sessions: u32,
    /// Heartbeat cadence while a solo session is active.
    pub heartbeat_interval_seconds: u64,
    /// Whether expiry and inactivity lock the session instead of ending it.
    pub enable_session_lock: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
            inactivity_timeout_minutes: 30,
            max_concurrent_sessions: 1,
            heartbeat_interval_seconds: 60,
            enable_session_lock: true,
        }
    }
}

impl SessionConfig {
    /// Inactivity timeout as a duration. Clamped to at least one minute so
    /// a degenerate server value cannot produce a zero interval.
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_minutes.max(1) * 60)
    }

    /// Heartbeat interval as a duration, clamped to at least one second.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds.max(1))
    }
}

/// Loads the session config, falling back to defaults on any failure.
///
/// Config fetch failure is never terminal: the session proceeds on the
/// defaults and a later [`load`](SessionConfigLoader::load) can pick up the
/// server's values.
pub struct SessionConfigLoader {
    client: Arc<AuthClient>,
}

impl SessionConfigLoader {
    /// Create a loader over the given client.
    pub fn new(client: Arc<AuthClient>) -> Self {
        Self { client }
    }

    /// Fetch the config; on any failure, log and return the defaults.
    pub async fn load(&self) -> SessionConfig {
        match self.client.fetch_session_config().await {
            Ok(config) => {
                debug!(
                    inactivity_timeout_minutes = config.inactivity_timeout_minutes,
                    heartbeat_interval_seconds = config.heartbeat_interval_seconds,
                    enable_session_lock = config.enable_session_lock,
                    "Session config loaded"
                );
                config
            }
            Err(e) => {
                warn!(error = %e, "Session config fetch failed, using defaults");
                SessionConfig::default()
            }
        }
    }
}
