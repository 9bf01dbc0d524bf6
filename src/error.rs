//! Error types and handling infrastructure for pollsync.
//!
//! The synchronizer reports every failure through [`SyncError`]. Errors are `Clone` because
//! one coalesced refresh result is handed to every caller awaiting it. Faults reported by the
//! external poll service use the narrower [`ServiceFault`] and are mapped into `SyncError`
//! depending on whether the failing call was a read or a mutation.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pollsync operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Caller error, never retried
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Another mutating command is in flight
    #[error("Another command is in progress")]
    Busy,

    /// Vote refused locally because the cached poll is inactive
    #[error("Poll {poll_id} is closed")]
    PollClosed { poll_id: u64 },

    /// Close refused locally because the cached poll is already inactive
    #[error("Poll {poll_id} is already closed")]
    AlreadyClosed { poll_id: u64 },

    /// The service refused the mutation
    #[error("Command rejected by poll service: {message}")]
    CommandRejected { message: String },

    /// Connectivity failure or timeout
    #[error("Poll service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Service reachable but returned malformed or error data
    #[error("Poll service error: {message}")]
    ServiceError { message: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

/// Fieldless classification of [`SyncError`] for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Busy,
    PollClosed,
    AlreadyClosed,
    CommandRejected,
    ServiceUnavailable,
    ServiceError,
    Config,
}

impl ErrorKind {
    /// Whether repeating the same call later may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Busy | ErrorKind::ServiceUnavailable)
    }
}

/// Standard Result type for pollsync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Create an InvalidInput error with a descriptive message
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a CommandRejected error with the service's reason
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::CommandRejected {
            message: message.into(),
        }
    }

    /// Create a Config error for the given file
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::InvalidInput { .. } => ErrorKind::InvalidInput,
            SyncError::Busy => ErrorKind::Busy,
            SyncError::PollClosed { .. } => ErrorKind::PollClosed,
            SyncError::AlreadyClosed { .. } => ErrorKind::AlreadyClosed,
            SyncError::CommandRejected { .. } => ErrorKind::CommandRejected,
            SyncError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            SyncError::ServiceError { .. } => ErrorKind::ServiceError,
            SyncError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Map a fault raised by a read call (count, details, vote count).
    pub fn from_read_fault(fault: ServiceFault) -> Self {
        match fault {
            ServiceFault::Unavailable(message) => Self::ServiceUnavailable { message },
            ServiceFault::Malformed(message) | ServiceFault::Rejected(message) => {
                Self::ServiceError { message }
            }
        }
    }

    /// Map a fault raised by a mutating call (create, vote, close).
    pub fn from_submit_fault(fault: ServiceFault) -> Self {
        match fault {
            ServiceFault::Unavailable(message) => Self::ServiceUnavailable { message },
            ServiceFault::Rejected(message) => Self::CommandRejected { message },
            ServiceFault::Malformed(message) => Self::ServiceError { message },
        }
    }
}

/// Failure reported by a [`PollService`](crate::service::PollService) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceFault {
    /// The connectivity layer could not be reached
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The service answered with an error or unusable data
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The service refused a mutation
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Result type returned by poll service calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceFault>;

/// Error kind paired with its human-readable message, as shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SyncError> for ErrorReport {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
