//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{RepositoryError, TransactionAbort};

/// 参加・退出処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("room is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error(transparent)]
    Store(RepositoryError),
}

impl From<RepositoryError> for MembershipError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(id) => MembershipError::RoomNotFound(id),
            RepositoryError::Aborted(TransactionAbort::CapacityExceeded { capacity }) => {
                MembershipError::CapacityExceeded { capacity }
            }
            other => MembershipError::Store(other),
        }
    }
}

/// GameClock へのゲーム開始要求のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartGameError {
    #[error("a game is already running in room '{0}'")]
    AlreadyRunning(String),

    #[error("problem '{0}' has no required cases")]
    NoRequiredCases(String),
}

/// ゲーム起動（HTTP 経由）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchGameError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("only the room owner may launch the game")]
    NotOwner,

    #[error("problem '{0}' not found")]
    ProblemNotFound(String),

    #[error("no problem selected")]
    NoProblemSelected,

    #[error("a game is already running in room '{0}'")]
    AlreadyRunning(String),

    #[error("problem '{0}' has no required cases")]
    NoRequiredCases(String),

    #[error(transparent)]
    Store(RepositoryError),
}

impl From<RepositoryError> for LaunchGameError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(id) => LaunchGameError::RoomNotFound(id),
            other => LaunchGameError::Store(other),
        }
    }
}

impl From<StartGameError> for LaunchGameError {
    fn from(error: StartGameError) -> Self {
        match error {
            StartGameError::AlreadyRunning(room) => LaunchGameError::AlreadyRunning(room),
            StartGameError::NoRequiredCases(problem) => LaunchGameError::NoRequiredCases(problem),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("room title must not be empty")]
    EmptyTitle,

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("invalid room id")]
    InvalidRoomId,

    #[error("room not found")]
    RoomNotFound,

    #[error(transparent)]
    Store(RepositoryError),
}

impl From<RepositoryError> for GetRoomDetailError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(_) => GetRoomDetailError::RoomNotFound,
            other => GetRoomDetailError::Store(other),
        }
    }
}
