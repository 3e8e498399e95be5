pub mod config;
pub mod db;
pub mod error;
pub mod exit_codes;
pub mod models;
pub mod reconcile;
pub mod source;

use std::path::Path;

use crate::db::ContactDb;
use crate::error::SyncResult;
use crate::reconcile::{RunSummary, UpsertStrategy};

/// Load the contacts file and reconcile it against the database.
///
/// The file is fully parsed before a connection is taken from the pool, so
/// input errors never touch the database.
pub async fn sync_file(
    db: &ContactDb,
    path: &Path,
    strategy: UpsertStrategy,
) -> SyncResult<RunSummary> {
    let records = source::load(path)?;
    reconcile::reconcile(db, &records, strategy).await
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use sqlx::migrate::Migrator;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use sqlx::{ConnectOptions, PgPool};
    use testcontainers_modules::postgres::Postgres;
    use testcontainers_modules::testcontainers::{
        ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
    };
    use thiserror::Error;
    use uuid::Uuid;

    use crate::db::ContactDb;

    pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    #[derive(Debug, Error)]
    pub enum TestDatabaseError {
        #[error("database error: {0}")]
        Sqlx(#[from] sqlx::Error),
        #[error("migration error: {0}")]
        Migration(#[from] sqlx::migrate::MigrateError),
        #[error("container error: {0}")]
        Container(#[from] TestcontainersError),
    }

    /// Disposable PostgreSQL database with the contacts schema applied.
    pub struct TestDatabase {
        pool: PgPool,
        _container: ContainerAsync<Postgres>,
    }

    impl TestDatabase {
        /// Start a Postgres container and create a fresh, migrated database in it.
        pub async fn new() -> Result<Self, TestDatabaseError> {
            let container = Postgres::default().start().await?;
            let host = container.get_host().await?.to_string();
            let port = container.get_host_port_ipv4(5432).await?;
            let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let admin_options: PgConnectOptions = admin_url.parse()?;
            let admin_options = admin_options.log_statements(log::LevelFilter::Off);
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options.clone())
                .await?;

            let database_name = format!("contacts_{}", Uuid::new_v4().simple());
            sqlx::query(&format!("CREATE DATABASE \"{}\"", database_name))
                .execute(&admin_pool)
                .await?;
            admin_pool.close().await;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect_with(admin_options.database(&database_name))
                .await?;

            MIGRATOR.run(&pool).await?;

            Ok(Self {
                pool,
                _container: container,
            })
        }

        pub fn pool(&self) -> &PgPool {
            &self.pool
        }

        pub fn contact_db(&self) -> ContactDb {
            ContactDb::from_pool(self.pool.clone())
        }

        /// Insert a contact row directly, bypassing the reconciler.
        pub async fn insert_contact(
            &self,
            email: &str,
            name: &str,
            phone: &str,
        ) -> Result<(), sqlx::Error> {
            sqlx::query("INSERT INTO contacts (email, name, phone) VALUES ($1, $2, $3)")
                .bind(email)
                .bind(name)
                .bind(phone)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        pub async fn close(self) {
            self.pool.close().await;
        }
    }
}
