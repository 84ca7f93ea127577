//! Assignee and creator backfill from the legacy free-text column.

use sea_orm::ConnectionTrait;
use tasktrack_lib::db::migrations::MigrationRunner;
use tasktrack_lib::migration::m20250730_070000_add_user_task_extensions::{
    BACKFILL_CREATOR_SQL, backfill_assignees_sql,
};
use tasktrack_lib::migration::{CreateRoles, CreateTaskTable, CreateUserTable};

use crate::test_helpers::*;

async fn creator_of(db: &TestDb, task_id: i32) -> i64 {
    scalar(
        &db.conn,
        r#"SELECT COALESCE("creator_id", 0)::BIGINT AS "n" FROM "task" WHERE "id" = $1"#,
        vec![task_id.into()],
    )
    .await
}

/// 1. Legacy data written before the normalization is linked during `up`.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_backfill_runs_on_legacy_data() {
    let db = test_db().await;

    let early = MigrationRunner::with_migrations(
        &db.conn,
        vec![
            Box::new(CreateTaskTable),
            Box::new(CreateUserTable),
            Box::new(CreateRoles),
        ],
    );
    assert_eq!(early.up().await.expect("early units failed").len(), 3);

    let first_admin = insert_legacy_user(&db.conn, "admin@example.com", "admin").await;
    let _second_admin = insert_legacy_user(&db.conn, "other-admin@example.com", "admin").await;
    let nva = insert_legacy_user(&db.conn, "nva@example.com", "user").await;

    let by_email = insert_legacy_task(&db.conn, "Mail match", Some("  NVA@Example.com ")).await;
    let nobody = insert_legacy_task(&db.conn, "No match", Some("Somebody Else")).await;
    let blank = insert_legacy_task(&db.conn, "Blank", Some("   ")).await;
    let unassigned = insert_legacy_task(&db.conn, "Unassigned", None).await;

    let applied = db.runner().up().await.expect("remaining units failed");
    assert_eq!(applied.len(), 2, "Only the two newer units should run");

    assert_eq!(assignees_of(&db.conn, by_email).await, vec![nva]);
    assert!(assignees_of(&db.conn, nobody).await.is_empty());
    assert!(assignees_of(&db.conn, blank).await.is_empty());
    assert!(assignees_of(&db.conn, unassigned).await.is_empty());

    for task in [by_email, nobody, blank, unassigned] {
        assert_eq!(
            creator_of(&db, task).await,
            i64::from(first_admin),
            "Creator should be the lowest-id admin"
        );
    }

    db.cleanup().await;
}

/// 2. Case-insensitive full name equality produces exactly one link.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_full_name_match_is_case_insensitive() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    let target = insert_user(&db.conn, "a@example.com", "user", Some("Nguyen Van A"), None).await;
    insert_user(&db.conn, "b@example.com", "user", Some("Tran Thi B"), None).await;
    let task = insert_legacy_task(&db.conn, "Fuzzy", Some("nguyen van a")).await;

    db.conn
        .execute_unprepared(&backfill_assignees_sql())
        .await
        .expect("backfill failed");

    assert_eq!(assignees_of(&db.conn, task).await, vec![target]);

    db.cleanup().await;
}

/// 3. Blank user fields never match everything.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_empty_user_fields_never_match() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    insert_user(&db.conn, "x@y.z", "user", Some(""), Some("  ")).await;
    insert_user(&db.conn, "q@y.z", "user", None, None).await;
    let task = insert_legacy_task(&db.conn, "Orphan", Some("zzz")).await;

    db.conn
        .execute_unprepared(&backfill_assignees_sql())
        .await
        .expect("backfill failed");

    assert!(assignees_of(&db.conn, task).await.is_empty());

    db.cleanup().await;
}

/// 4. Substring matching is loose: a short name can link several users.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_substring_match_can_link_several_users() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    let an = insert_user(&db.conn, "an1@example.com", "user", Some("An"), None).await;
    let tran_an = insert_user(&db.conn, "an2@example.com", "user", Some("Tran An"), None).await;
    let task = insert_legacy_task(&db.conn, "Loose", Some("an")).await;

    db.conn
        .execute_unprepared(&backfill_assignees_sql())
        .await
        .expect("backfill failed");

    let mut expected = vec![an, tran_an];
    expected.sort();
    assert_eq!(assignees_of(&db.conn, task).await, expected);

    db.cleanup().await;
}

/// 5. Re-running the backfill changes nothing.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_backfill_rerun_is_stable() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    let admin = insert_user(&db.conn, "root@example.com", "admin", Some("Root"), None).await;
    let dev = insert_user(&db.conn, "dev@example.com", "user", Some("Le Van C"), Some("levanc")).await;
    let task = insert_legacy_task(&db.conn, "Stable", Some("levanc")).await;

    for _ in 0..2 {
        db.conn
            .execute_unprepared(&backfill_assignees_sql())
            .await
            .expect("backfill failed");
        db.conn
            .execute_unprepared(BACKFILL_CREATOR_SQL)
            .await
            .expect("creator backfill failed");
    }

    assert_eq!(assignees_of(&db.conn, task).await, vec![dev]);
    assert_eq!(count_rows(&db.conn, "task_assignees").await, 1);
    assert_eq!(creator_of(&db, task).await, i64::from(admin));

    // A newer admin must not take over existing tasks.
    insert_user(&db.conn, "newer@example.com", "admin", None, None).await;
    db.conn
        .execute_unprepared(BACKFILL_CREATOR_SQL)
        .await
        .expect("creator backfill failed");
    assert_eq!(creator_of(&db, task).await, i64::from(admin));

    db.cleanup().await;
}
