//! Auth API client for the Opsdesk backend.
//!
//! This crate provides:
//! - `AuthClient`: stateless request functions against the `/api/v1/auth`
//!   endpoints, with in-flight deduplication for token refresh
//! - `SessionConfigLoader`: server-declared timing policy with hard-coded
//!   fallback defaults
//! - `AuthEventBus`: fire-and-forget broadcast of authentication failures
//!   (`unauthorized` / `session_expired`) from any call site
//!
//! The client never decides what a failure means for the session; it reports
//! outcomes and publishes events, and the session lifecycle reacts.

mod client;
mod config;
mod error;
mod events;
mod types;

pub use client::AuthClient;
pub use config::{SessionConfig, SessionConfigLoader};
pub use error::{AuthError, AuthResult};
pub use events::{AuthEvent, AuthEventBus};
pub use types::{
    Credentials, CurrentUser, DeployMode, LoginResponse, RefreshOutcome, RefreshedTokens,
    UserAccount,
};
