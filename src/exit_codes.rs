//! Process exit codes.
//!
//! Scripts driving the sync rely on these to tell a clean run from a
//! rolled-back one.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success, transaction committed                  |
//! | 1    | General error                                   |
//! | 2    | Input file missing, unreadable or malformed     |
//! | 3    | Configuration error                             |
//! | 4    | Could not connect to or acquire from the pool   |
//! | 5    | A row failed, transaction rolled back           |
//! | 6    | Commit or rollback itself failed                |

use crate::error::SyncError;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_INPUT: u8 = 2;
pub const EXIT_CONFIG: u8 = 3;
pub const EXIT_CONNECTION: u8 = 4;
pub const EXIT_ROLLED_BACK: u8 = 5;
pub const EXIT_TRANSACTION: u8 = 6;

pub fn for_error(err: &SyncError) -> u8 {
    match err {
        SyncError::Io { .. } | SyncError::Parse(_) => EXIT_INPUT,
        SyncError::Config(_) => EXIT_CONFIG,
        SyncError::Connection(_) => EXIT_CONNECTION,
        SyncError::Query { .. } => EXIT_ROLLED_BACK,
        SyncError::Commit(_) | SyncError::Rollback { .. } => EXIT_TRANSACTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn every_failure_is_non_zero() {
        let errors = [
            SyncError::parse("bad header"),
            SyncError::Config(ConfigError::Missing("DB_HOST")),
            SyncError::Connection(sqlx::Error::PoolTimedOut),
            SyncError::Query {
                row: 1,
                source: sqlx::Error::RowNotFound,
            },
            SyncError::Commit(sqlx::Error::WorkerCrashed),
        ];

        for err in &errors {
            assert_ne!(for_error(err), EXIT_SUCCESS, "{err}");
            assert_ne!(for_error(err), EXIT_ERROR, "{err}");
        }
        assert_eq!(for_error(&errors[3]), EXIT_ROLLED_BACK);
    }
}
