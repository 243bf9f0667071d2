//! Session lifecycle orchestration.
//!
//! [`SessionManager`] owns the state machine and everything that feeds it:
//!
//! ```text
//!    heartbeat task          inactivity task
//!         |                        |
//!         | POST heartbeat        | idle >= timeout
//!         v                        v
//!    AuthEventBus -----------> listener task
//!    (401 outcomes)                |
//!                           handle_signal
//!                                  |
//!                            SessionMachine
//! ```
//!
//! The periodic tasks never touch the state machine directly. The heartbeat
//! reports token outcomes through the event bus and the inactivity check
//! sends an internal signal; both funnel into one listener task, so every
//! state change goes through a single dispatch path and stale or duplicate
//! triggers die in the transition table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use auth_client::{
    AuthClient, AuthEvent, Credentials, CurrentUser, DeployMode, RefreshOutcome, SessionConfig,
    SessionConfigLoader, UserAccount,
};
use serde::Serialize;
use session_storage::{TokenPair, TokenStore};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::activity::ActivityTracker;
use crate::error::{LifecycleError, LifecycleResult};
use crate::fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::scheduler::GatedTask;

/// Poll cadence for the inactivity check.
const INACTIVITY_POLL_INTERVAL: Duration = Duration::from_secs(10);

const SIGNAL_CHANNEL_CAPACITY: usize = 8;

/// The authenticated account, held for the lifetime of a session.
#[derive(Debug, Clone)]
struct Identity {
    user: UserAccount,
    permissions: Vec<String>,
    mode: DeployMode,
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserAccount>,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeployMode>,
}

/// Payload delivered to the state change callback.
#[derive(Debug, Clone, Serialize)]
pub struct SessionChangedPayload {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeployMode>,
}

pub type SessionCallback = Box<dyn Fn(SessionChangedPayload) + Send + Sync>;

/// Internal triggers funneled into the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleSignal {
    AuthFailure(AuthEvent),
    IdleTimeout,
}

/// Client-side session and authentication lifecycle.
///
/// All state transitions go through [`SessionManager`]; it is the only
/// writer of the token store. Construct one per process, call
/// [`SessionManager::start`] to attach the event listener, then
/// [`SessionManager::bootstrap`] once at startup.
pub struct SessionManager {
    client: Arc<AuthClient>,
    config_loader: SessionConfigLoader,
    tokens: Arc<dyn TokenStore>,
    fsm: Mutex<SessionMachine>,
    identity: Mutex<Option<Identity>>,
    session_config: Mutex<SessionConfig>,
    config_loaded: AtomicBool,
    activity: Arc<ActivityTracker>,
    heartbeat_task: GatedTask,
    inactivity_task: GatedTask,
    signal_tx: mpsc::Sender<LifecycleSignal>,
    signal_rx: Mutex<Option<mpsc::Receiver<LifecycleSignal>>>,
    listener_handle: Mutex<Option<JoinHandle<()>>>,
    state_callback: Mutex<Option<SessionCallback>>,
}

impl SessionManager {
    pub fn new(client: Arc<AuthClient>, tokens: Arc<dyn TokenStore>) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            config_loader: SessionConfigLoader::new(Arc::clone(&client)),
            client,
            tokens,
            fsm: Mutex::new(SessionMachine::new()),
            identity: Mutex::new(None),
            session_config: Mutex::new(SessionConfig::default()),
            config_loaded: AtomicBool::new(false),
            activity: Arc::new(ActivityTracker::new()),
            heartbeat_task: GatedTask::new("heartbeat"),
            inactivity_task: GatedTask::new("inactivity"),
            signal_tx,
            signal_rx: Mutex::new(Some(signal_rx)),
            listener_handle: Mutex::new(None),
            state_callback: Mutex::new(None),
        }
    }

    /// Spawn the listener that funnels auth events and internal signals into
    /// the dispatch path. Holds only a weak reference, so dropping the last
    /// `Arc<SessionManager>` ends the listener.
    pub fn start(self: &Arc<Self>) {
        let mut rx_slot = self.signal_rx.lock().unwrap();
        let Some(mut signals) = rx_slot.take() else {
            warn!("Session manager listener already started");
            return;
        };
        drop(rx_slot);

        let mut events = self.client.events().subscribe();
        let manager = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => LifecycleSignal::AuthFailure(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Auth event listener lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    maybe_signal = signals.recv() => match maybe_signal {
                        Some(signal) => signal,
                        None => break,
                    },
                };

                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.handle_signal(signal).await;
            }
            debug!("Session lifecycle listener stopped");
        });

        *self.listener_handle.lock().unwrap() = Some(handle);
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.fsm.lock().unwrap().state())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        let identity = self.identity.lock().unwrap().clone();
        SessionSnapshot {
            authenticated: state.is_authenticated(),
            state,
            user: identity.as_ref().map(|i| i.user.clone()),
            permissions: identity
                .as_ref()
                .map(|i| i.permissions.clone())
                .unwrap_or_default(),
            mode: identity.as_ref().map(|i| i.mode),
        }
    }

    /// The timing policy currently in effect. Defaults until the first
    /// successful [`SessionManager::refresh_session_config`].
    pub fn session_config(&self) -> SessionConfig {
        self.session_config.lock().unwrap().clone()
    }

    /// Record user interaction for the inactivity timeout.
    pub fn record_activity(&self) {
        self.activity.touch();
    }

    pub fn set_state_callback(&self, callback: SessionCallback) {
        *self.state_callback.lock().unwrap() = Some(callback);
    }

    /// Validate the stored session on startup.
    ///
    /// Loads the session config first, so timers never arm against guessed
    /// values, then resolves the stored pair against the server with at most
    /// one token refresh.
    ///
    /// Returns `Ok(true)` if a session is active, `Ok(false)` if nothing
    /// usable was stored, and `Err` if the stored pair was rejected by the
    /// server and has been cleared.
    pub async fn bootstrap(&self) -> LifecycleResult<bool> {
        self.refresh_session_config().await;

        let pair = match self.tokens.load() {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                info!("No stored session found on startup");
                let _ = self.transition(&SessionMachineInput::NoSession);
                return Ok(false);
            }
            Err(e) => {
                warn!(error = %e, "Token store unreadable, starting unauthenticated");
                let _ = self.transition(&SessionMachineInput::NoSession);
                return Ok(false);
            }
        };

        match self.resolve_session(pair).await {
            Ok(current) => {
                info!(username = %current.user.username, "Session validated on startup");
                *self.identity.lock().unwrap() = Some(Identity {
                    user: current.user,
                    permissions: current.permissions,
                    mode: current.mode,
                });
                self.transition(&SessionMachineInput::SessionValidated)?;
                self.activity.touch();
                self.sync_timers();
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Startup session validation failed, clearing session");
                self.terminate_session();
                Err(e)
            }
        }
    }

    /// Authenticate with credentials.
    ///
    /// Credential rejection propagates to the caller and leaves the session
    /// state untouched. Permissions hydrate on the next current-user fetch.
    pub async fn login(&self, credentials: &Credentials) -> LifecycleResult<()> {
        let response = self.client.login(credentials).await?;
        info!(username = %response.user.username, "Logged in");

        self.persist_pair(&response.access_token, &response.refresh_token)?;
        *self.identity.lock().unwrap() = Some(Identity {
            user: response.user,
            permissions: Vec::new(),
            mode: response.mode,
        });

        self.transition(&SessionMachineInput::LoginSucceeded)?;
        self.activity.touch();

        if self.config_loaded.load(Ordering::SeqCst) {
            self.sync_timers();
        } else {
            self.refresh_session_config().await;
        }
        Ok(())
    }

    /// Re-authenticate a locked session with the locked account's username.
    ///
    /// Only valid in `Locked`. Failure propagates and the session stays
    /// locked.
    pub async fn unlock(&self, password: &str) -> LifecycleResult<()> {
        if !self.state().is_locked() {
            return Err(LifecycleError::NotLocked);
        }

        let username = self
            .identity
            .lock()
            .unwrap()
            .as_ref()
            .map(|i| i.user.username.clone())
            .ok_or(LifecycleError::NotAuthenticated)?;

        let credentials = Credentials::new(username, password);
        let response = self.client.login(&credentials).await?;
        info!(username = %response.user.username, "Session unlocked");

        self.persist_pair(&response.access_token, &response.refresh_token)?;
        {
            let mut identity = self.identity.lock().unwrap();
            match identity.as_mut() {
                // Keep permissions hydrated before the lock.
                Some(identity) => {
                    identity.user = response.user;
                    identity.mode = response.mode;
                }
                None => {
                    *identity = Some(Identity {
                        user: response.user,
                        permissions: Vec::new(),
                        mode: response.mode,
                    });
                }
            }
        }

        self.transition(&SessionMachineInput::LoginSucceeded)?;
        self.activity.touch();
        self.sync_timers();
        Ok(())
    }

    /// End the session: best-effort server notify, clear the stored pair,
    /// drop to `Unauthenticated`, cancel timers. Safe to call from any state.
    pub async fn logout(&self) {
        if let Ok(Some(pair)) = self.tokens.load() {
            self.client.logout(&pair.access_token).await;
        }
        self.terminate_session();
        info!("Logged out");
    }

    /// Re-run the current-user fetch to rehydrate identity and permissions.
    ///
    /// Returns `Ok(true)` when the identity was refreshed, `Ok(false)` when
    /// no pair is stored. A server rejection ends the session and
    /// propagates.
    pub async fn refresh_auth(&self) -> LifecycleResult<bool> {
        if !self.state().is_authenticated() {
            return Err(LifecycleError::NotAuthenticated);
        }

        let pair = match self.tokens.load() {
            Ok(Some(pair)) => pair,
            _ => return Ok(false),
        };

        match self.resolve_session(pair).await {
            Ok(current) => {
                *self.identity.lock().unwrap() = Some(Identity {
                    user: current.user,
                    permissions: current.permissions,
                    mode: current.mode,
                });
                // Mode may have changed server-side.
                self.sync_timers();
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Auth refresh failed, ending session");
                self.terminate_session();
                Err(e)
            }
        }
    }

    /// Reload the timing policy from the server and rearm timers with the
    /// new values. Falls back to defaults when the fetch fails.
    pub async fn refresh_session_config(&self) {
        let config = self.config_loader.load().await;
        *self.session_config.lock().unwrap() = config;
        self.config_loaded.store(true, Ordering::SeqCst);

        // Restart both tasks so interval changes take effect.
        self.heartbeat_task.stop();
        self.inactivity_task.stop();
        self.sync_timers();
    }

    /// Cancel timers and the event listener. Session state and storage are
    /// left as they are.
    pub fn shutdown(&self) {
        self.heartbeat_task.stop();
        self.inactivity_task.stop();
        if let Some(handle) = self.listener_handle.lock().unwrap().take() {
            handle.abort();
        }
        debug!("Session manager shut down");
    }

    /// Fetch the current user, refreshing the pair at most once.
    async fn resolve_session(&self, pair: TokenPair) -> LifecycleResult<CurrentUser> {
        let fetch_err = match self.client.fetch_current_user(&pair.access_token).await {
            Ok(current) => return Ok(current),
            Err(e) => e,
        };
        debug!(error = %fetch_err, "Current user fetch failed, attempting token refresh");

        match self.client.refresh(&pair.refresh_token).await {
            RefreshOutcome::Refreshed(tokens) => {
                self.persist_pair(&tokens.access_token, &tokens.refresh_token)?;
                Ok(self
                    .client
                    .fetch_current_user(&tokens.access_token)
                    .await?)
            }
            RefreshOutcome::Failed => Err(fetch_err.into()),
        }
    }

    async fn handle_signal(&self, signal: LifecycleSignal) {
        match signal {
            LifecycleSignal::AuthFailure(AuthEvent::Unauthorized) => {
                info!("Unauthorized response reported, ending session");
                self.terminate_session();
            }
            LifecycleSignal::AuthFailure(AuthEvent::SessionExpired) => {
                self.handle_session_expired().await;
            }
            LifecycleSignal::IdleTimeout => {
                self.lock_session("inactivity_timeout");
            }
        }
    }

    /// Expiry policy: lock when the session lock is enabled and somebody is
    /// signed in, otherwise try one silent refresh and end the session if
    /// that fails.
    async fn handle_session_expired(&self) {
        if self.session_config().enable_session_lock {
            if self.identity.lock().unwrap().is_some() {
                self.lock_session("session_expired");
            } else {
                debug!("Session expired with no active identity, ignoring");
            }
            return;
        }

        let refresh_token = match self.tokens.load() {
            Ok(Some(pair)) => pair.refresh_token,
            _ => {
                info!("Session expired with no stored tokens, ending session");
                self.terminate_session();
                return;
            }
        };

        match self.client.refresh(&refresh_token).await {
            RefreshOutcome::Refreshed(tokens) => {
                match self.persist_pair(&tokens.access_token, &tokens.refresh_token) {
                    Ok(()) => info!("Session recovered by silent token refresh"),
                    Err(e) => {
                        warn!(error = %e, "Failed to persist refreshed tokens, ending session");
                        self.terminate_session();
                    }
                }
            }
            RefreshOutcome::Failed => {
                info!("Silent token refresh failed, ending session");
                self.terminate_session();
            }
        }
    }

    fn lock_session(&self, cause: &str) {
        match self.transition(&SessionMachineInput::LockTriggered) {
            Ok(_) => {
                info!(cause, "Session locked");
                self.sync_timers();
            }
            Err(e) => debug!(cause, error = %e, "Lock request ignored"),
        }
    }

    /// Clear credentials and identity and drop to `Unauthenticated`. The
    /// session config survives.
    fn terminate_session(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
        *self.identity.lock().unwrap() = None;
        let _ = self.transition(&SessionMachineInput::SessionTerminated);
        self.sync_timers();
    }

    fn persist_pair(&self, access_token: &str, refresh_token: &str) -> LifecycleResult<()> {
        self.tokens
            .store(&TokenPair::new(access_token, refresh_token))?;
        Ok(())
    }

    fn transition(&self, input: &SessionMachineInput) -> Result<SessionState, LifecycleError> {
        let mut fsm = self.fsm.lock().unwrap();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            LifecycleError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(old_state = ?old_state, new_state = ?new_state, "Session state transition");
            self.notify_state_change(&new_state);
        }

        Ok(new_state)
    }

    fn notify_state_change(&self, state: &SessionState) {
        let (username, mode) = {
            let identity = self.identity.lock().unwrap();
            (
                identity.as_ref().map(|i| i.user.username.clone()),
                identity.as_ref().map(|i| i.mode),
            )
        };

        let callback = self.state_callback.lock().unwrap();
        if let Some(callback) = callback.as_ref() {
            callback(SessionChangedPayload {
                state: state.clone(),
                username,
                mode,
            });
        }
    }

    /// Both periodic tasks run only while authenticated in solo mode with
    /// the session lock enabled, and never before the config has loaded.
    fn timers_active(&self) -> bool {
        if !self.config_loaded.load(Ordering::SeqCst) {
            return false;
        }
        if !self.state().is_authenticated() {
            return false;
        }
        if !self.session_config().enable_session_lock {
            return false;
        }
        matches!(
            self.identity.lock().unwrap().as_ref().map(|i| i.mode),
            Some(DeployMode::Solo)
        )
    }

    /// Reconcile both timers with the current state, mode, and config.
    fn sync_timers(&self) {
        let active = self.timers_active();
        let config = self.session_config();

        let client = Arc::clone(&self.client);
        let tokens = Arc::clone(&self.tokens);
        self.heartbeat_task
            .sync(active, config.heartbeat_interval(), move || {
                let client = Arc::clone(&client);
                let tokens = Arc::clone(&tokens);
                async move {
                    let pair = match tokens.load() {
                        Ok(Some(pair)) => pair,
                        _ => return,
                    };
                    client.heartbeat(&pair.access_token).await;
                }
            });

        let activity = Arc::clone(&self.activity);
        let timeout = config.inactivity_timeout();
        let signal_tx = self.signal_tx.clone();
        self.inactivity_task
            .sync(active, INACTIVITY_POLL_INTERVAL, move || {
                let activity = Arc::clone(&activity);
                let signal_tx = signal_tx.clone();
                async move {
                    if activity.idle_for() >= timeout {
                        let _ = signal_tx.try_send(LifecycleSignal::IdleTimeout);
                    }
                }
            });
    }

    #[cfg(test)]
    pub(crate) fn timers_running(&self) -> (bool, bool) {
        (
            self.heartbeat_task.is_running(),
            self.inactivity_task.is_running(),
        )
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
