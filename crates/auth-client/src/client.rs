//! HTTP client for the `/api/v1/auth` endpoints.

use crate::error::{AuthError, AuthResult};
use crate::events::{AuthEvent, AuthEventBus};
use crate::types::{Credentials, CurrentUser, LoginResponse, RefreshOutcome, RefreshedTokens};
use crate::SessionConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Error code the server attaches to a heartbeat 401 when the session was
/// expired rather than merely unauthenticated.
const SESSION_EXPIRED_CODE: &str = "SESSION_EXPIRED";

/// Token refresh request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

/// Error body shape for auth endpoints that attach a machine-readable code.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
}

/// Tracks the most recent refresh so concurrent demand for the same token
/// collapses into a single network call.
#[derive(Default)]
struct RefreshGate {
    consumed_token: Option<String>,
    outcome: Option<RefreshOutcome>,
}

/// Client for the Opsdesk auth API.
///
/// Holds no session state beyond the refresh dedup gate; tokens are supplied
/// per call by the session lifecycle.
pub struct AuthClient {
    http_client: reqwest::Client,
    base_url: String,
    events: AuthEventBus,
    refresh_gate: Mutex<RefreshGate>,
}

impl AuthClient {
    /// Create a new client for the given base URL.
    ///
    /// A trailing slash on the base URL is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client: reqwest::Client::new(),
            base_url,
            events: AuthEventBus::new(),
            refresh_gate: Mutex::new(RefreshGate::default()),
        }
    }

    /// The auth failure event bus shared by this client's call sites.
    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    /// Build the full URL for an auth endpoint path.
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticate with username and password.
    ///
    /// Any non-2xx response is a credential rejection the caller must
    /// handle; the error carries the server's message.
    pub async fn login(&self, credentials: &Credentials) -> AuthResult<LoginResponse> {
        let url = self.endpoint("/api/v1/auth/login");
        debug!(url = %url, username = %credentials.username, "Attempting login");

        let response = self.http_client.post(&url).json(credentials).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Login rejected");
            return Err(AuthError::InvalidCredentials(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: LoginResponse = response.json().await?;
        info!(username = %data.user.username, mode = ?data.mode, "Login successful");
        Ok(data)
    }

    /// Exchange a refresh token for a rotated pair.
    ///
    /// Silent by contract: rejections and transport failures are logged and
    /// reported as [`RefreshOutcome::Failed`]; callers decide whether that
    /// ends the session.
    ///
    /// Concurrent calls holding the same refresh token are deduplicated:
    /// the first caller performs the network call while the rest wait, then
    /// receive the recorded outcome. A caller holding a different (already
    /// rotated) token performs a fresh call.
    pub async fn refresh(&self, refresh_token: &str) -> RefreshOutcome {
        let mut gate = self.refresh_gate.lock().await;

        if gate.consumed_token.as_deref() == Some(refresh_token) {
            if let Some(outcome) = gate.outcome.clone() {
                debug!("Refresh already performed for this token, reusing outcome");
                return outcome;
            }
        }

        gate.consumed_token = Some(refresh_token.to_string());
        gate.outcome = None;

        let outcome = self.request_refresh(refresh_token).await;
        gate.outcome = Some(outcome.clone());
        outcome
    }

    /// Single refresh attempt, no dedup.
    async fn request_refresh(&self, refresh_token: &str) -> RefreshOutcome {
        let url = self.endpoint("/api/v1/auth/refresh");
        debug!(url = %url, "Refreshing token pair");

        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };

        let response = match self.http_client.post(&url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Token refresh request failed");
                return RefreshOutcome::Failed;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token refresh rejected");
            return RefreshOutcome::Failed;
        }

        match response.json::<RefreshedTokens>().await {
            Ok(tokens) => {
                info!("Token pair refreshed");
                RefreshOutcome::Refreshed(tokens)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh response malformed");
                RefreshOutcome::Failed
            }
        }
    }

    /// Fetch the authenticated account, its permissions, and the deployment
    /// mode.
    ///
    /// A 401 maps to [`AuthError::Unauthorized`]; reacting to it (refresh,
    /// retry, teardown) is the caller's job.
    pub async fn fetch_current_user(&self, access_token: &str) -> AuthResult<CurrentUser> {
        let url = self.endpoint("/api/v1/auth/me");
        debug!(url = %url, "Fetching current user");

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!("Current user fetch unauthorized");
            return Err(AuthError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Current user fetch failed");
            return Err(AuthError::Server {
                status,
                message: body,
            });
        }

        let user: CurrentUser = response.json().await?;
        debug!(username = %user.user.username, "Current user fetched");
        Ok(user)
    }

    /// Tell the server the session is ending. Best-effort: every failure is
    /// logged and swallowed, local teardown proceeds regardless.
    pub async fn logout(&self, access_token: &str) {
        let url = self.endpoint("/api/v1/auth/logout");

        match self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => debug!("Server notified of logout"),
            Ok(r) => debug!(status = %r.status(), "Logout notification rejected"),
            Err(e) => debug!(error = %e, "Logout notification failed"),
        }
    }

    /// Post a liveness heartbeat.
    ///
    /// Fire-and-forget. A 401 carrying the `SESSION_EXPIRED` code publishes
    /// [`AuthEvent::SessionExpired`]; any other 401 publishes
    /// [`AuthEvent::Unauthorized`]; everything else is logged and ignored.
    pub async fn heartbeat(&self, access_token: &str) {
        let url = self.endpoint("/api/v1/auth/heartbeat");

        let response = match self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "Heartbeat request failed");
                return;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Heartbeat acknowledged");
            return;
        }

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            if is_session_expired_body(&body) {
                warn!("Heartbeat reports session expired");
                self.events.publish(AuthEvent::SessionExpired);
            } else {
                warn!(body = %body, "Heartbeat unauthorized");
                self.events.publish(AuthEvent::Unauthorized);
            }
        } else {
            debug!(status = %status, "Heartbeat returned an error");
        }
    }

    /// Fetch the server-declared session timing policy. No authentication
    /// required.
    pub async fn fetch_session_config(&self) -> AuthResult<SessionConfig> {
        let url = self.endpoint("/api/v1/auth/session-config");
        debug!(url = %url, "Fetching session config");

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Server {
                status,
                message: body,
            });
        }

        let config: SessionConfig = response.json().await?;
        Ok(config)
    }
}

/// Check whether an error body carries the session-expired code.
fn is_session_expired_body(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.code)
        .as_deref()
        == Some(SESSION_EXPIRED_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let client = AuthClient::new("http://127.0.0.1:8600");
        assert_eq!(
            client.endpoint("/api/v1/auth/login"),
            "http://127.0.0.1:8600/api/v1/auth/login"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let client = AuthClient::new("http://127.0.0.1:8600/");
        assert_eq!(
            client.endpoint("/api/v1/auth/me"),
            "http://127.0.0.1:8600/api/v1/auth/me"
        );
    }

    #[test]
    fn test_refresh_request_wire_shape() {
        let request = RefreshRequest {
            refresh_token: "ref-1".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["refreshToken"], "ref-1");
    }

    #[test]
    fn test_session_expired_body_detection() {
        assert!(is_session_expired_body(r#"{"code": "SESSION_EXPIRED"}"#));
        assert!(is_session_expired_body(
            r#"{"code": "SESSION_EXPIRED", "message": "session expired"}"#
        ));
        assert!(!is_session_expired_body(r#"{"code": "OTHER"}"#));
        assert!(!is_session_expired_body(r#"{"message": "no code"}"#));
        assert!(!is_session_expired_body("not json"));
        assert!(!is_session_expired_body(""));
    }
}
