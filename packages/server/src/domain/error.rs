//! Domain layer errors.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
}

/// Errors raised by repositories (session store, name pool)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room '{0}' already exists")]
    DuplicateRoomId(String),

    #[error("No unreserved display name is available")]
    NamePoolExhausted,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while delivering an event to a single connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Connection '{0}' is not registered")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Failed to encode event: {0}")]
    Encode(String),
}

/// Lobby state transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("Connection '{0}' is not registered in the lobby")]
    NotRegistered(String),

    #[error("Connection '{0}' is already waiting for a match")]
    AlreadyWaiting(String),

    #[error("Connection '{0}' is being paired")]
    PairingInProgress(String),
}
