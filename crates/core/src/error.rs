//! Error taxonomy for the session core.

use thiserror::Error;

/// Result type used across the session core.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure modes surfaced by the session core.
///
/// Keep this focused on what callers can react to. Only `Unauthorized`
/// carries a side effect (the gateway has already purged the credential
/// and emptied the session by the time it surfaces); every other
/// variant leaves state exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The bearer token could not be decoded; treated as absence of
    /// identity, never as a fatal condition.
    #[error("malformed token: {0}")]
    Decode(String),

    /// The server rejected the credential. The session has ended.
    #[error("unauthorized")]
    Unauthorized,

    /// The local role check refused the operation before dispatch.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The server was reachable but rejected the request.
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },

    /// The server could not be reached. The prior session is preserved.
    #[error("network error: {0}")]
    Transport(String),

    /// The persistent credential store failed.
    #[error("credential store error: {0}")]
    Store(String),

    /// A payload failed local validation before dispatch.
    #[error("validation failed: {0}")]
    Invalid(String),
}

impl AuthError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Whether this failure ended the session. Consumers treat it as a
    /// redirect-to-login signal once the session reflects no user.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
