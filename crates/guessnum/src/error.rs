//! Session error types.

use derive_more::{Display, Error};
use guessnum_game::{CodeError, IdError};

/// Broad category of a [`SessionError`], used to decide how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum SessionErrorKind {
    /// Malformed name, secret, guess or room code. Never reaches the network.
    Validation,
    /// Unknown room code or game id.
    NotFound,
    /// Room already full, or a guess after the game ended.
    Conflict,
    /// Transport failure or unusable reply; worth retrying.
    ServiceUnavailable,
    /// Action not allowed in the current state or role.
    IllegalOperation,
}

impl SessionErrorKind {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, SessionErrorKind::ServiceUnavailable)
    }
}

/// Session error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{} error: {} at {}:{}", kind, message, file, line)]
pub struct SessionError {
    /// Category.
    pub kind: SessionErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SessionError {
    /// Creates an error of `kind` with caller location tracking.
    #[track_caller]
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A [`SessionErrorKind::Validation`] error.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Validation, message)
    }

    /// A [`SessionErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::NotFound, message)
    }

    /// A [`SessionErrorKind::Conflict`] error.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Conflict, message)
    }

    /// A [`SessionErrorKind::ServiceUnavailable`] error.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::ServiceUnavailable, message)
    }

    /// A [`SessionErrorKind::IllegalOperation`] error.
    #[track_caller]
    pub fn illegal(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::IllegalOperation, message)
    }
}

impl From<CodeError> for SessionError {
    #[track_caller]
    fn from(err: CodeError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<IdError> for SessionError {
    #[track_caller]
    fn from(err: IdError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<reqwest::Error> for SessionError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::unavailable(format!("Request failed: {}", err))
    }
}
