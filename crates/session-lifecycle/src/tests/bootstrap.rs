//! Startup validation and session config loading.

use std::sync::Arc;

use auth_client::{AuthClient, SessionConfig};
use session_storage::{MemoryTokenStore, TokenPair, TokenStore};

use super::harness::{Canned, TestSession};
use crate::{LifecycleError, SessionManager, SessionState};

#[tokio::test]
async fn test_bootstrap_without_stored_tokens() {
    let session = TestSession::new().await;

    let active = session.manager.bootstrap().await.unwrap();
    assert!(!active);
    assert_eq!(session.manager.state(), SessionState::Unauthenticated);
    assert_eq!(session.server.hits("session-config"), 1);
    assert_eq!(session.server.hits("me"), 0);
}

#[tokio::test]
async fn test_bootstrap_with_valid_tokens() {
    let session = TestSession::new().await;
    session.preload_tokens();

    let active = session.manager.bootstrap().await.unwrap();
    assert!(active);

    let snapshot = session.manager.snapshot();
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.user.unwrap().username, "ada");
    assert_eq!(snapshot.permissions, vec!["scripts:read", "scripts:run"]);

    // Valid pair, no refresh needed.
    assert_eq!(session.server.hits("refresh"), 0);
    let me = session.server.last_request("me").unwrap();
    assert_eq!(me.authorization.as_deref(), Some("Bearer acc-1"));
    assert_eq!(session.manager.timers_running(), (true, true));
}

#[tokio::test]
async fn test_bootstrap_refreshes_expired_access_token() {
    let session = TestSession::new().await;
    session.preload_tokens();
    session
        .server
        .enqueue("me", Canned::json(401, r#"{"message":"Unauthorized"}"#));

    let active = session.manager.bootstrap().await.unwrap();
    assert!(active);
    assert_eq!(session.manager.state(), SessionState::Authenticated);

    // Exactly one refresh, then one retry with the rotated token.
    assert_eq!(session.server.hits("refresh"), 1);
    assert_eq!(session.server.hits("me"), 2);
    let retry = session.server.last_request("me").unwrap();
    assert_eq!(retry.authorization.as_deref(), Some("Bearer acc-2"));

    let stored = session.store.load().unwrap().unwrap();
    assert_eq!(stored, TokenPair::new("acc-2", "ref-2"));
}

#[tokio::test]
async fn test_bootstrap_clears_session_when_refresh_rejected() {
    let session = TestSession::new().await;
    session.preload_tokens();
    session
        .server
        .set_default("me", Canned::json(401, r#"{"message":"Unauthorized"}"#));
    session.server.set_default(
        "refresh",
        Canned::json(401, r#"{"message":"Refresh token expired"}"#),
    );

    let err = session.manager.bootstrap().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Auth(_)));
    assert_eq!(session.manager.state(), SessionState::Unauthenticated);
    assert!(session.store.load().unwrap().is_none());
    assert_eq!(session.server.hits("refresh"), 1);
    assert_eq!(session.manager.timers_running(), (false, false));
}

#[tokio::test]
async fn test_bootstrap_uses_config_defaults_when_endpoint_fails() {
    let session = TestSession::new().await;
    session.preload_tokens();
    session
        .server
        .set_default("session-config", Canned::json(500, r#"{"message":"boom"}"#));

    let active = session.manager.bootstrap().await.unwrap();
    assert!(active);
    assert_eq!(session.manager.session_config(), SessionConfig::default());
    // Timers still arm, just against the defaults.
    assert_eq!(session.manager.timers_running(), (true, true));
}

#[tokio::test]
async fn test_bootstrap_with_unreachable_server_clears_session() {
    let client = Arc::new(AuthClient::new("http://127.0.0.1:9"));
    let store = Arc::new(MemoryTokenStore::new());
    store.store(&TokenPair::new("acc-1", "ref-1")).unwrap();
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&client),
        Arc::clone(&store) as Arc<dyn TokenStore>,
    ));
    manager.start();

    let err = manager.bootstrap().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Auth(_)));
    assert_eq!(manager.state(), SessionState::Unauthenticated);
    assert!(store.load().unwrap().is_none());
}
