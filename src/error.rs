use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures of a single contact sync run.
///
/// Input errors (`Io`, `Parse`) happen before any database interaction.
/// `Query` and `Rollback` mean the transaction was abandoned and nothing from
/// the run is visible in the contacts table.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed contacts file: {0}")]
    Parse(String),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to acquire database connection: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("row {row} failed, transaction rolled back: {source}")]
    Query {
        row: usize,
        #[source]
        source: sqlx::Error,
    },
    #[error("commit failed: {0}")]
    Commit(#[source] sqlx::Error),
    #[error("row {row} failed ({query}) and rollback failed: {rollback}")]
    Rollback {
        row: usize,
        query: sqlx::Error,
        rollback: sqlx::Error,
    },
}

impl SyncError {
    pub fn parse(message: impl Into<String>) -> Self {
        SyncError::Parse(message.into())
    }

    /// True when the run never touched the database.
    pub fn is_input_error(&self) -> bool {
        matches!(self, SyncError::Io { .. } | SyncError::Parse(_))
    }
}

impl From<csv::Error> for SyncError {
    fn from(err: csv::Error) -> Self {
        match err.position() {
            Some(pos) => SyncError::Parse(format!("line {}: {}", pos.line(), err)),
            None => SyncError::Parse(err.to_string()),
        }
    }
}
