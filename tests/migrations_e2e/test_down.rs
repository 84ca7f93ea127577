//! Reverting units newest first.

use crate::test_helpers::*;

/// 1. Each step reverts only the newest applied unit.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_down_reverts_newest_first() {
    let db = test_db().await;
    let runner = db.runner();
    runner.up().await.expect("up failed");

    let reverted = runner.down(1).await.expect("down failed");
    assert_eq!(reverted, vec!["m20250730_172413_add_user_aggregates".to_string()]);
    assert!(!column_exists(&db.conn, "user", "total_orders").await);
    assert!(!index_exists(&db.conn, "user_total_orders_index").await);
    assert!(!index_exists(&db.conn, "user_total_spending_index").await);
    assert!(table_exists(&db.conn, "ticket").await, "Older unit must stay applied");
    assert_eq!(ledger(&db.conn).await.len(), 4);

    assert!(constraint_exists(&db.conn, "task_creator_id_foreign").await);
    assert!(index_exists(&db.conn, "task_status_index").await);
    assert!(index_exists(&db.conn, "user_status_index").await);

    let reverted = runner.down(1).await.expect("second down failed");
    assert_eq!(
        reverted,
        vec!["m20250730_070000_add_user_task_extensions".to_string()]
    );
    assert!(!table_exists(&db.conn, "ticket").await);
    assert!(!table_exists(&db.conn, "task_assignees").await);
    assert!(!column_exists(&db.conn, "user", "full_name").await);
    assert!(column_exists(&db.conn, "task", "assignee").await);
    assert!(
        !constraint_exists(&db.conn, "task_creator_id_foreign").await,
        "Foreign keys added by the reverted unit must be gone"
    );
    assert!(!constraint_exists(&db.conn, "ticket_task_id_foreign").await);
    for index in ["task_status_index", "task_priority_index", "user_status_index", "user_email_index"] {
        assert!(!index_exists(&db.conn, index).await, "Index {} should be dropped", index);
    }
    assert!(
        constraint_exists(&db.conn, "user_role_id_foreign").await,
        "Older units keep their constraints"
    );
    assert_eq!(ledger(&db.conn).await.len(), 3);

    let reapplied = runner.up().await.expect("reapply failed");
    assert_eq!(reapplied.len(), 2);
    assert_eq!(ledger(&db.conn).await.len(), 5);

    db.cleanup().await;
}

/// 2. Asking for more steps than applied reverts everything and stops.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_down_past_start_reverts_all() {
    let db = test_db().await;
    let runner = db.runner();
    runner.up().await.expect("up failed");

    let reverted = runner.down(10).await.expect("down failed");
    assert_eq!(reverted.len(), 5);
    assert_eq!(
        reverted.first().map(String::as_str),
        Some("m20250730_172413_add_user_aggregates")
    );
    assert_eq!(
        reverted.last().map(String::as_str),
        Some("m20250723_054540_create_task_table")
    );
    assert!(!table_exists(&db.conn, "task").await);
    assert!(!table_exists(&db.conn, "user").await);
    assert!(ledger(&db.conn).await.is_empty());

    let again = runner.down(1).await.expect("down on empty ledger failed");
    assert!(again.is_empty());

    db.cleanup().await;
}
