//! PostgreSQL access for the contacts table.
//!
//! [`ContactDb`] owns the connection pool for the lifetime of the process:
//! created once from a [`DatabaseConfig`], lent to the reconciler by
//! reference, and closed once on shutdown.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use crate::config::DatabaseConfig;
use crate::error::SyncResult;
use crate::models::{ContactRecord, ContactRow};
use crate::reconcile::{ContactHandle, ContactStore, RowAction};

#[derive(Clone)]
pub struct ContactDb {
    pool: PgPool,
}

impl ContactDb {
    /// Build the pool without connecting.
    ///
    /// Connections are only opened when a run checks one out, so a bad
    /// input file never touches the database.
    pub fn open(config: &DatabaseConfig) -> SyncResult<Self> {
        let options = config.connect_options()?;
        log::info!(
            "contacts database pool ready (max {} connections)",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All stored contacts ordered by email.
    pub async fn fetch_contacts(&self) -> Result<Vec<ContactRow>, sqlx::Error> {
        sqlx::query_as::<_, ContactRow>("SELECT email, name, phone FROM contacts ORDER BY email")
            .fetch_all(&self.pool)
            .await
    }

    /// Wait for checked-out connections to come back, then close the pool.
    pub async fn close(&self) {
        log::info!("closing contacts database pool");
        self.pool.close().await;
    }
}

/// One open transaction on a checked-out pool connection.
///
/// The connection returns to the pool when the transaction is committed,
/// rolled back, or dropped.
pub struct PgContactHandle {
    tx: Transaction<'static, Postgres>,
}

impl ContactStore for ContactDb {
    type Handle = PgContactHandle;

    async fn begin(&self) -> Result<PgContactHandle, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(PgContactHandle { tx })
    }
}

impl ContactHandle for PgContactHandle {
    async fn count_by_email(&mut self, email: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE email = $1")
            .bind(email)
            .fetch_one(&mut *self.tx)
            .await
    }

    async fn update_contact(&mut self, record: &ContactRecord) -> Result<u64, sqlx::Error> {
        // rows already holding these values are not counted as changed
        let result = sqlx::query(
            r#"UPDATE contacts
               SET name = $1, phone = $2
               WHERE email = $3
                 AND (name IS DISTINCT FROM $1 OR phone IS DISTINCT FROM $2)"#,
        )
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.email)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_contact(&mut self, record: &ContactRecord) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO contacts (email, name, phone) VALUES ($1, $2, $3)")
            .bind(&record.email)
            .bind(&record.name)
            .bind(&record.phone)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn upsert_contact(
        &mut self,
        record: &ContactRecord,
    ) -> Result<(RowAction, u64), sqlx::Error> {
        // xmax is zero only for a freshly inserted tuple
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"INSERT INTO contacts (email, name, phone)
               VALUES ($1, $2, $3)
               ON CONFLICT (email) DO UPDATE
               SET name = EXCLUDED.name, phone = EXCLUDED.phone
               WHERE contacts.name IS DISTINCT FROM EXCLUDED.name
                  OR contacts.phone IS DISTINCT FROM EXCLUDED.phone
               RETURNING (xmax = 0) AS inserted"#,
        )
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.phone)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(match inserted {
            Some(true) => (RowAction::Inserted, 1),
            Some(false) => (RowAction::Updated, 1),
            None => (RowAction::Updated, 0),
        })
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}
