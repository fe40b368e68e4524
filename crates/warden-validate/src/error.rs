//! Validation error taxonomy.

use thiserror::Error;
use warden_state::StateError;

/// Result type alias for validator operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Why a request was rejected.
///
/// Each rule variant carries the user-facing message and whether the
/// rejection is worth logging on the server side.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema or semantic violation in the payload.
    #[error("{message}")]
    InvalidData { message: String, log_message: bool },

    /// A referenced record does not exist.
    #[error("{message}")]
    NotFound { message: String, log_message: bool },

    /// Uniqueness violation.
    #[error("{message}")]
    AlreadyExists { message: String, log_message: bool },

    /// Policy or state violation (locked environment, legacy provider, ...).
    #[error("{message}")]
    NotAllowed { message: String, log_message: bool },

    /// Referential-integrity guard on deletion.
    #[error("{message}")]
    CannotDelete { message: String, log_message: bool },

    /// The catalog could not answer a lookup.
    #[error("state store error: {0}")]
    State(#[from] StateError),
}

/// Classification of a [`ValidationError`], for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidData,
    NotFound,
    AlreadyExists,
    NotAllowed,
    CannotDelete,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidData => "invalid_data",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotAllowed => "not_allowed",
            ErrorKind::CannotDelete => "cannot_delete",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ValidationError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
            log_message: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            log_message: false,
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
            log_message: false,
        }
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::NotAllowed {
            message: message.into(),
            log_message: false,
        }
    }

    pub fn cannot_delete(message: impl Into<String>) -> Self {
        Self::CannotDelete {
            message: message.into(),
            log_message: false,
        }
    }

    /// Mark the error as worth logging by the caller.
    pub fn logged(mut self) -> Self {
        match &mut self {
            Self::InvalidData { log_message, .. }
            | Self::NotFound { log_message, .. }
            | Self::AlreadyExists { log_message, .. }
            | Self::NotAllowed { log_message, .. }
            | Self::CannotDelete { log_message, .. } => *log_message = true,
            Self::State(_) => {}
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidData { .. } => ErrorKind::InvalidData,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotAllowed { .. } => ErrorKind::NotAllowed,
            Self::CannotDelete { .. } => ErrorKind::CannotDelete,
            Self::State(_) => ErrorKind::Internal,
        }
    }

    /// Store failures are always logged.
    pub fn should_log(&self) -> bool {
        match self {
            Self::InvalidData { log_message, .. }
            | Self::NotFound { log_message, .. }
            | Self::AlreadyExists { log_message, .. }
            | Self::NotAllowed { log_message, .. }
            | Self::CannotDelete { log_message, .. } => *log_message,
            Self::State(_) => true,
        }
    }
}
