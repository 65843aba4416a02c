//! Domain-level error types.

use thiserror::Error;

/// Value object validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} must be at most {max} bytes")]
    TooLong { kind: &'static str, max: usize },

    #[error("difficulty must be 1, 2 or 3 (got {0})")]
    InvalidDifficulty(u8),
}

/// Reasons a room transaction body refuses to commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionAbort {
    #[error("room is already full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },
}

/// Failures reported by the room document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("transaction on room '{room}' kept conflicting after {attempts} attempts")]
    Conflict { room: String, attempts: usize },

    #[error("transaction aborted: {0}")]
    Aborted(TransactionAbort),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Credential verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid or expired credential")]
    InvalidToken,
}

/// Malformed or disallowed inbound wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message type")]
    UnknownType,

    #[error("update type '{0}' may only be sent by the server")]
    ServerOnlyUpdate(String),

    #[error("invalid data for update '{kind}': {reason}")]
    InvalidUpdateData { kind: String, reason: String },
}
