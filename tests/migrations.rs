use contact_sync::test_support::{MIGRATOR, TestDatabase, TestDatabaseError};

#[tokio::test]
async fn migrations_apply_and_revert_cleanly() {
    let test_db = match TestDatabase::new().await {
        Ok(db) => db,
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping migration revert test: no container runtime ({err})");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let pool = test_db.pool().clone();

    MIGRATOR.undo(&pool, 0).await.expect("migrations revert");

    let contact_tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'contacts'",
    )
    .fetch_one(&pool)
    .await
    .expect("lookup succeeded");

    assert_eq!(contact_tables, 0, "contacts should be dropped after revert");

    MIGRATOR.run(&pool).await.expect("migrations rerun");

    let contact_tables_after: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'contacts'",
    )
    .fetch_one(&pool)
    .await
    .expect("lookup succeeded");

    assert_eq!(contact_tables_after, 1);

    test_db.close().await;
}
