//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::model::{EmployeeError, QuestionError, SessionPhase};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by directory providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DirectoryError {
    #[error("directory request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("directory rejected the request: {0}")]
    Rpc(String),
    #[error("directory returned an empty response")]
    EmptyResponse,
    #[error(transparent)]
    Employee(#[from] EmployeeError),
    #[error("cannot read roster file: {0}")]
    RosterFile(#[from] std::io::Error),
    #[error("cannot parse roster file: {0}")]
    RosterFormat(#[from] serde_json::Error),
}

/// Errors emitted by `ScoreService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScoreServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {operation} while the session is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error("an answer is still being revealed")]
    RevealPending,
    #[error("session size must be > 0")]
    InvalidSessionSize,
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Score(#[from] ScoreServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
