//! A failing unit rolls back and stops the run.

use tasktrack_lib::db::migrations::{MigrationError, MigrationRunner};
use tasktrack_lib::migration::{AddUserAggregates, AddUserTaskExtensions, CreateUserTable};

use crate::test_helpers::*;

/// 1. The extension unit fails without a task table. Its partial work is
///    rolled back, the earlier unit stays recorded, later units never run.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_failed_unit_is_rolled_back() {
    let db = test_db().await;

    let runner = MigrationRunner::with_migrations(
        &db.conn,
        vec![
            Box::new(CreateUserTable),
            Box::new(AddUserTaskExtensions),
            Box::new(AddUserAggregates),
        ],
    );
    let err = runner.up().await.expect_err("unit must fail without a task table");
    match err {
        MigrationError::Failed { name, .. } => {
            assert_eq!(name, "m20250730_070000_add_user_task_extensions");
        }
        other => panic!("Expected Failed, got {:?}", other),
    }

    assert_eq!(
        ledger(&db.conn).await,
        vec!["m20250726_061226_create_user_table".to_string()]
    );
    assert!(table_exists(&db.conn, "user").await);
    assert!(
        !column_exists(&db.conn, "user", "username").await,
        "Additive columns must be rolled back"
    );
    assert!(
        !column_exists(&db.conn, "user", "total_orders").await,
        "Later units must not run"
    );

    db.cleanup().await;
}
