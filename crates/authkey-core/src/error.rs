//! Protocol error taxonomy and HTTP status mapping.
//!
//! Verification failures are ordinary [`AuthError`] values, never panics:
//! the server lifecycle turns the first failure into an HTTP reply, the
//! client reports it back to the caller.

use std::fmt;

/// Protocol error codes carried in the JSON error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    /// Library misuse, configuration or transport fault (not a protocol violation).
    InternalError,
    /// A required security header is absent.
    MissingSecurityHeader,
    /// The auth header is malformed.
    InvalidHeader,
    /// The timestamp falls outside the replay window.
    RequestTimeTooSkewed,
    /// The HMAC signature does not match.
    SignatureDoesNotMatch,
}

impl ErrorCode {
    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status_code(self) -> http::StatusCode {
        match self {
            Self::MissingSecurityHeader | Self::InvalidHeader => http::StatusCode::BAD_REQUEST,
            Self::RequestTimeTooSkewed | Self::SignatureDoesNotMatch => http::StatusCode::FORBIDDEN,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The wire spelling of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InternalError => "InternalError",
            Self::MissingSecurityHeader => "MissingSecurityHeader",
            Self::InvalidHeader => "InvalidHeader",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol verification failure: a code plus human-readable detail.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code} - {message}")]
pub struct AuthError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable detail, safe to echo in an error body.
    pub message: String,
}

impl AuthError {
    /// Create an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for an [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        self.code.status_code()
    }
}

/// Convenience result type for protocol operations.
pub type AuthResult<T> = Result<T, AuthError>;
