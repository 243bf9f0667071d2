//! Storage key constants.

/// Field names under which the token pair is persisted.
///
/// These match the keys the web client uses for its local storage entries,
/// so a document written by one client is readable by another.
pub struct StorageKeys;

impl StorageKeys {
    /// Access token
    pub const ACCESS_TOKEN: &'static str = "auth_access_token";

    /// Refresh token
    pub const REFRESH_TOKEN: &'static str = "auth_refresh_token";
}
