//! Re-running migrations against an already migrated or partially migrated
//! schema must not fail or duplicate data.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::{MigrationTrait, SchemaManager};
use tasktrack_lib::db::migrations::MigrationState;
use tasktrack_lib::migration::{AddUserTaskExtensions, m20250728_095000_create_roles::SEED_ROLES};

use crate::test_helpers::*;

/// 1. A fresh schema gets every unit, a second run applies nothing.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_up_twice_applies_nothing_the_second_time() {
    let db = test_db().await;
    let runner = db.runner();

    let first = runner.up().await.expect("first up failed");
    assert_eq!(first.len(), 5, "Fresh schema should apply all units");

    let second = runner.up().await.expect("second up failed");
    assert!(second.is_empty(), "Second run should apply nothing: {:?}", second);

    assert_eq!(ledger(&db.conn).await.len(), 5);
    let status = runner.status().await.expect("status failed");
    assert!(
        status.iter().all(|s| s.state == MigrationState::Applied),
        "Every unit should be applied"
    );

    db.cleanup().await;
}

/// 2. Seeding roles again leaves exactly two rows.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_role_seed_is_idempotent() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    db.conn.execute_unprepared(SEED_ROLES).await.expect("reseed failed");
    db.conn.execute_unprepared(SEED_ROLES).await.expect("reseed failed");

    assert_eq!(count_rows(&db.conn, "roles").await, 2, "Roles must not duplicate");

    db.cleanup().await;
}

/// 3. Every statement of the five-phase unit tolerates its own prior effects.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_extension_unit_reruns_on_migrated_schema() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");

    let admin = insert_user(&db.conn, "boss@example.com", "admin", Some("The Boss"), None).await;
    let dev = insert_user(&db.conn, "dev@example.com", "user", Some("Nguyen Van A"), None).await;
    let task = insert_legacy_task(&db.conn, "Legacy", Some("nguyen van a")).await;

    let manager = SchemaManager::new(&db.conn);
    AddUserTaskExtensions.up(&manager).await.expect("first rerun failed");
    AddUserTaskExtensions.up(&manager).await.expect("second rerun failed");

    assert_eq!(assignees_of(&db.conn, task).await, vec![dev]);
    let creator = scalar(
        &db.conn,
        r#"SELECT "creator_id"::BIGINT AS "n" FROM "task" WHERE "id" = $1"#,
        vec![task.into()],
    )
    .await;
    assert_eq!(creator, i64::from(admin));

    db.cleanup().await;
}

/// 4. Objects created by hand before the run are tolerated.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_partial_prior_state_is_tolerated() {
    let db = test_db().await;

    db.conn
        .execute_unprepared(
            r#"
            CREATE TABLE "user" (
                "id" SERIAL PRIMARY KEY,
                "email" VARCHAR(255) NOT NULL,
                "password" VARCHAR(255) NOT NULL,
                "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                "username" VARCHAR(255)
            );
            CREATE TABLE "task_assignees" (
                "task_id" INT NOT NULL,
                "user_id" INT NOT NULL,
                CONSTRAINT "task_assignees_pkey" PRIMARY KEY ("task_id", "user_id")
            );
            "#,
        )
        .await
        .expect("prior state setup failed");

    let applied = db.runner().up().await.expect("up over partial state failed");
    assert_eq!(applied.len(), 5);
    assert!(column_exists(&db.conn, "user", "full_name").await);
    assert!(column_exists(&db.conn, "user", "total_orders").await);

    db.cleanup().await;
}
