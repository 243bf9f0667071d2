//! Auth API error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Auth API error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The server rejected the supplied credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server rejected the access token (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success response
    #[error("Server error: HTTP {status}: {message}")]
    Server { status: StatusCode, message: String },

    /// Transport-level request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be
    /// retried later without changing session state.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Server { status, .. } => status.is_server_error(),
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_5xx_is_transient() {
        let err = AuthError::Server {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "maintenance".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_4xx_is_not_transient() {
        let err = AuthError::Server {
            status: StatusCode::FORBIDDEN,
            message: "nope".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_invalid_credentials_is_not_transient() {
        assert!(!AuthError::InvalidCredentials("bad password".to_string()).is_transient());
    }

    #[test]
    fn test_unauthorized_is_not_transient() {
        assert!(!AuthError::Unauthorized.is_transient());
    }
}
