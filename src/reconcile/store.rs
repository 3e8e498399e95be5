//! The storage seam the reconciler runs against.
//!
//! A [`ContactStore`] hands out one transactional [`ContactHandle`] per run.
//! Everything the handle does stays invisible to other sessions until
//! [`ContactHandle::commit`]; dropping or rolling back discards it. Consuming
//! the handle in `commit`/`rollback` returns the underlying connection to its
//! pool.

use crate::models::ContactRecord;
use crate::reconcile::stats::RowAction;

#[allow(async_fn_in_trait)]
pub trait ContactStore {
    type Handle: ContactHandle;

    /// Check out a connection and open a transaction on it.
    async fn begin(&self) -> Result<Self::Handle, sqlx::Error>;
}

#[allow(async_fn_in_trait)]
pub trait ContactHandle {
    /// Number of rows stored under `email`, including writes made earlier
    /// in this transaction.
    async fn count_by_email(&mut self, email: &str) -> Result<i64, sqlx::Error>;

    /// Overwrite name and phone for `record.email`, returning the number of
    /// rows whose values actually changed.
    async fn update_contact(&mut self, record: &ContactRecord) -> Result<u64, sqlx::Error>;

    /// Insert a new row, returning the affected row count.
    async fn insert_contact(&mut self, record: &ContactRecord) -> Result<u64, sqlx::Error>;

    /// Insert or update in one atomic statement.
    async fn upsert_contact(
        &mut self,
        record: &ContactRecord,
    ) -> Result<(RowAction, u64), sqlx::Error>;

    async fn commit(self) -> Result<(), sqlx::Error>;

    async fn rollback(self) -> Result<(), sqlx::Error>;
}
