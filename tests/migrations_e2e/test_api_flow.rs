//! End-to-end flow over the HTTP surface on a migrated schema.

use actix_web::http::Method;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde_json::json;

use crate::test_helpers::*;

async fn promote_to_admin(db: &TestDb, user_id: i64) {
    db.conn
        .execute_raw(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"UPDATE "user" SET "role_id" = (SELECT "id" FROM "roles" WHERE "name" = 'admin') WHERE "id" = $1"#,
            [(user_id as i32).into()],
        ))
        .await
        .expect("promote failed");
}

/// 1. Readiness reflects migration state.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_ready_tracks_pending_migrations() {
    let db = test_db().await;
    let app = create_test_app(&db).await;

    let (status, body) = call(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, 503, "Unmigrated schema should not be ready");
    assert_eq!(body["pending_migrations"], 5);
    assert!(
        !table_exists(&db.conn, "schema_migrations").await,
        "Readiness checks must not create the ledger"
    );

    db.runner().up().await.expect("up failed");

    let (status, body) = call(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, 200, "Migrated schema should be ready: {}", body);
    assert_eq!(body["pending_migrations"], 0);

    db.cleanup().await;
}

/// 2. Register, log in, assign a task, review a ticket and log work.
#[actix_rt::test]
#[ignore = "requires PostgreSQL via TT_TEST_DATABASE_URL"]
async fn test_task_ticket_and_work_log_flow() {
    let db = test_db().await;
    db.runner().up().await.expect("up failed");
    let app = create_test_app(&db).await;

    // Accounts
    let (status, boss) = call(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"email": "Boss@Example.com", "password": "secret123", "full_name": "The Boss"})),
    )
    .await;
    assert_eq!(status, 201, "Register failed: {}", boss);
    assert_eq!(boss["email"], "boss@example.com", "Email should be normalized");
    assert_eq!(boss["role"], "user", "Registration always grants the user role");
    let boss_id = boss["id"].as_i64().expect("boss id");

    let (status, dev) = call(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"email": "dev@example.com", "password": "secret123", "full_name": "Nguyen Van A"})),
    )
    .await;
    assert_eq!(status, 201, "Register failed: {}", dev);
    let dev_id = dev["id"].as_i64().expect("dev id");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"email": "DEV@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, 409, "Duplicate email should conflict");

    promote_to_admin(&db, boss_id).await;

    let (status, wrong_password) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "dev@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, 401);

    let (status, unknown) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(
        unknown["message"], wrong_password["message"],
        "Unknown emails and wrong passwords must be indistinguishable"
    );

    let login = |email: &'static str| {
        let app = &app;
        async move {
            let (status, body) = call(
                app,
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": email, "password": "secret123"})),
            )
            .await;
            assert_eq!(status, 200, "Login failed: {}", body);
            body["token"].as_str().expect("token").to_string()
        }
    };
    let boss_token = login("boss@example.com").await;
    let dev_token = login("dev@example.com").await;

    let (status, me) = call(&app, Method::GET, "/api/v1/auth/me", Some(&boss_token), None).await;
    assert_eq!(status, 200);
    assert_eq!(me["role"], "admin");

    let (status, _) = call(&app, Method::GET, "/api/v1/tasks", None, None).await;
    assert_eq!(status, 401, "Tasks require a token");

    // Tasks
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/tasks",
        Some(&boss_token),
        Some(json!({"title": "Ghost", "assignee_ids": [999999]})),
    )
    .await;
    assert_eq!(status, 400, "Unknown assignees should be rejected");

    let (status, task) = call(
        &app,
        Method::POST,
        "/api/v1/tasks",
        Some(&boss_token),
        Some(json!({"title": "Ship it", "priority": "high", "assignee_ids": [dev_id]})),
    )
    .await;
    assert_eq!(status, 201, "Create task failed: {}", task);
    assert_eq!(task["creator_id"], boss_id);
    assert_eq!(task["assignee_ids"], json!([dev_id]));
    let task_id = task["id"].as_i64().expect("task id");

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/v1/tasks?page=1844674407370955161&limit=100",
        Some(&dev_token),
        None,
    )
    .await;
    assert_eq!(status, 400, "Pages past the offset range are rejected");

    let (status, list) = call(
        &app,
        Method::GET,
        &format!("/api/v1/tasks?assignee_id={}", dev_id),
        Some(&dev_token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(list["pagination"]["total"], 1);

    // Tickets
    let (status, ticket) = call(
        &app,
        Method::POST,
        &format!("/api/v1/tasks/{}/tickets", task_id),
        Some(&dev_token),
        Some(json!({"title": "Need more time"})),
    )
    .await;
    assert_eq!(status, 201, "Create ticket failed: {}", ticket);
    assert_eq!(ticket["status"], "pending");
    let ticket_id = ticket["id"].as_i64().expect("ticket id");
    let approve = format!("/api/v1/tickets/{}/approve", ticket_id);
    let reject = format!("/api/v1/tickets/{}/reject", ticket_id);

    let (status, _) = call(&app, Method::POST, &approve, Some(&dev_token), None).await;
    assert_eq!(status, 403, "Requester cannot approve their own ticket");

    let (status, reviewed) = call(
        &app,
        Method::POST,
        &approve,
        Some(&boss_token),
        Some(json!({"notes": "ok"})),
    )
    .await;
    assert_eq!(status, 200, "Approve failed: {}", reviewed);
    assert_eq!(reviewed["status"], "approved");
    assert_eq!(reviewed["approved_by_id"], boss_id);

    let (status, _) = call(&app, Method::POST, &approve, Some(&boss_token), None).await;
    assert_eq!(status, 409, "Decided tickets are final");
    let (status, _) = call(&app, Method::POST, &reject, Some(&boss_token), None).await;
    assert_eq!(status, 409, "Decided tickets are final");

    // Work log
    let log_uri = format!("/api/v1/tasks/{}/log-work", task_id);
    let (status, _) = call(
        &app,
        Method::POST,
        &log_uri,
        Some(&dev_token),
        Some(json!({"date": "2025-08-01", "hours_worked": "25"})),
    )
    .await;
    assert_eq!(status, 400, "More than 24 hours per entry is invalid");

    for (token, hours) in [(&dev_token, "7.5"), (&boss_token, "0.5")] {
        let (status, entry) = call(
            &app,
            Method::POST,
            &log_uri,
            Some(token),
            Some(json!({"date": "2025-08-01", "hours_worked": hours})),
        )
        .await;
        assert_eq!(status, 201, "Log work failed: {}", entry);
    }

    let (status, logs) = call(&app, Method::GET, &log_uri, Some(&dev_token), None).await;
    assert_eq!(status, 200);
    assert_eq!(logs["entries"].as_array().map(Vec::len), Some(2));
    let total: Decimal = logs["total_hours"]
        .as_str()
        .expect("total_hours string")
        .parse()
        .expect("decimal");
    assert_eq!(total, Decimal::new(8, 0));

    // Tasks with history cannot be deleted
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/v1/tasks/{}", task_id),
        Some(&boss_token),
        None,
    )
    .await;
    assert_eq!(status, 409);

    db.cleanup().await;
}
