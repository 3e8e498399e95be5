//! Contact reconciliation.
//!
//! Applies a list of [`ContactRecord`]s to the contacts table inside a single
//! transaction:
//!
//! 1. **Open** - check out one handle and begin a transaction
//! 2. **Apply** - for each record, in order, update the row if the email is
//!    known or insert it otherwise
//! 3. **Finish** - commit once after the last record, or roll everything back
//!    on the first failure
//!
//! The handle goes back to the pool on every path out of [`reconcile`].
//! Records are never reordered; a later record with the same email sees the
//! row written by an earlier one through the open transaction.

pub mod stats;
pub mod store;

pub use stats::{RowAction, RowTrace, RunSummary};
pub use store::{ContactHandle, ContactStore};

use std::fmt;

use crate::error::{SyncError, SyncResult};
use crate::models::ContactRecord;

/// How a single record is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UpsertStrategy {
    /// Count rows by email, then update or insert. Assumes no other writer
    /// touches the same emails while the run is open.
    #[default]
    CheckThenWrite,
    /// One `INSERT .. ON CONFLICT DO UPDATE` per record. Safe with concurrent
    /// runs against the same table.
    OnConflict,
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    TransactionOpen,
    Committed,
    RolledBack,
    HandleReleased,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::TransactionOpen => "transaction open",
            RunState::Committed => "committed",
            RunState::RolledBack => "rolled back",
            RunState::HandleReleased => "handle released",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(state: RunState) {
    log::debug!("reconcile: {}", state);
}

/// Reconcile `records` against the store in one transaction.
///
/// On success the returned summary covers every record. On failure nothing
/// from this run is committed and the error says which row broke it.
pub async fn reconcile<S: ContactStore>(
    store: &S,
    records: &[ContactRecord],
    strategy: UpsertStrategy,
) -> SyncResult<RunSummary> {
    enter(RunState::Idle);
    let mut handle = store.begin().await.map_err(SyncError::Connection)?;
    enter(RunState::TransactionOpen);
    log::info!(
        "reconciling {} contacts ({:?})",
        records.len(),
        strategy
    );

    let mut summary = RunSummary::start();

    for (index, record) in records.iter().enumerate() {
        match apply_record(&mut handle, record, strategy).await {
            Ok((action, rows_affected)) => {
                let trace = summary.record(&record.email, action, rows_affected);
                log::debug!(
                    "email {} ({}): {} -> {} row(s) changed",
                    trace.ordinal,
                    trace.action.label(),
                    trace.email,
                    trace.rows_affected
                );
            }
            Err(source) => {
                let row = index + 1;
                log::error!("failed to insert/update contact {}: {}", row, source);

                let result = handle.rollback().await;
                if result.is_ok() {
                    enter(RunState::RolledBack);
                }
                enter(RunState::HandleReleased);
                enter(RunState::Done);

                return match result {
                    Ok(()) => {
                        log::warn!("transaction rolled back, no contacts were changed");
                        Err(SyncError::Query { row, source })
                    }
                    Err(rollback) => {
                        log::error!("rollback failed: {}", rollback);
                        Err(SyncError::Rollback {
                            row,
                            query: source,
                            rollback,
                        })
                    }
                };
            }
        }
    }

    match handle.commit().await {
        Ok(()) => {
            enter(RunState::Committed);
            enter(RunState::HandleReleased);
            enter(RunState::Done);
            log::info!("contacts successfully inserted/updated");
            Ok(summary.finish())
        }
        Err(err) => {
            log::error!("commit failed: {}", err);
            enter(RunState::HandleReleased);
            enter(RunState::Done);
            Err(SyncError::Commit(err))
        }
    }
}

async fn apply_record<H: ContactHandle>(
    handle: &mut H,
    record: &ContactRecord,
    strategy: UpsertStrategy,
) -> Result<(RowAction, u64), sqlx::Error> {
    match strategy {
        UpsertStrategy::CheckThenWrite => {
            if handle.count_by_email(&record.email).await? > 0 {
                let changed = handle.update_contact(record).await?;
                Ok((RowAction::Updated, changed))
            } else {
                let inserted = handle.insert_contact(record).await?;
                Ok((RowAction::Inserted, inserted))
            }
        }
        UpsertStrategy::OnConflict => handle.upsert_contact(record).await,
    }
}
