//! Ordering checks run before any unit touches the schema.

use tasktrack_lib::db::migrations::{MigrationError, MigrationRunner};
use tasktrack_lib::migration::{AddUserAggregates, CreateTaskTable, CreateUserTable};

use crate::test_helpers::*;

/// 1. A list declared out of order is refused and nothing runs.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_out_of_order_list_is_refused() {
    let db = test_db().await;

    let runner = MigrationRunner::with_migrations(
        &db.conn,
        vec![Box::new(CreateUserTable), Box::new(CreateTaskTable)],
    );
    let err = runner.up().await.expect_err("out-of-order list must fail");
    assert!(
        matches!(err, MigrationError::OutOfOrder { .. }),
        "Expected OutOfOrder, got {:?}",
        err
    );
    assert!(!table_exists(&db.conn, "task").await);
    assert!(!table_exists(&db.conn, "user").await);

    db.cleanup().await;
}

/// 2. A pending unit older than an applied one is refused.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_pending_before_applied_is_refused() {
    let db = test_db().await;

    let skipping = MigrationRunner::with_migrations(
        &db.conn,
        vec![
            Box::new(CreateTaskTable),
            Box::new(CreateUserTable),
            Box::new(AddUserAggregates),
        ],
    );
    skipping.up().await.expect("subset up failed");

    let err = db.runner().up().await.expect_err("gap must be refused");
    match err {
        MigrationError::PendingBeforeApplied { pending, applied } => {
            assert_eq!(pending, "m20250728_095000_create_roles");
            assert_eq!(applied, "m20250730_172413_add_user_aggregates");
        }
        other => panic!("Expected PendingBeforeApplied, got {:?}", other),
    }
    assert!(!table_exists(&db.conn, "roles").await, "Nothing should have run");

    db.cleanup().await;
}

/// 3. A ledger entry this binary does not know is refused.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_unknown_applied_unit_is_refused() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    let older_binary = MigrationRunner::with_migrations(
        &db.conn,
        vec![Box::new(CreateTaskTable), Box::new(CreateUserTable)],
    );
    let err = older_binary.up().await.expect_err("unknown unit must be refused");
    assert!(
        matches!(err, MigrationError::UnknownApplied(_)),
        "Expected UnknownApplied, got {:?}",
        err
    );

    db.cleanup().await;
}
