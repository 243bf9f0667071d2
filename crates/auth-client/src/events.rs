//! Auth failure event bus.
//!
//! Any HTTP call site that hits an authentication failure publishes here;
//! the session lifecycle subscribes and decides how the session reacts.
//! Publishing is fire-and-forget: zero, one, or many subscribers are all
//! valid, and a publish never blocks or fails the publishing call.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Authentication failure reported by a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    /// The server rejected the access token outright.
    Unauthorized,
    /// The server declared the session expired (e.g. heartbeat 401 with the
    /// `SESSION_EXPIRED` code).
    SessionExpired,
}

/// Broadcast channel for [`AuthEvent`]s.
#[derive(Clone)]
pub struct AuthEventBus {
    event_tx: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    /// Create a new bus.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(16);
        Self { event_tx }
    }

    /// Subscribe to auth events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.event_tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: AuthEvent) {
        match self.event_tx.send(event) {
            Ok(receivers) => debug!(?event, receivers, "Auth event published"),
            Err(_) => debug!(?event, "Auth event published with no subscribers"),
        }
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}
