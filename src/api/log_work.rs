//! Work log endpoints.

use actix_web::{HttpResponse, get, post, web};
use tracing::info;

use crate::auth::JwtAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{CreateLogWorkRequest, LogWorkListResponse, LogWorkResponse};

/// Configure work log routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_log_work).service(create_log_work);
}

/// List work logged on a task.
///
/// GET /api/v1/tasks/{id}/log-work
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}/log-work",
    tag = "Work Log",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Entries and total hours", body = LogWorkListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/tasks/{id}/log-work")]
pub async fn list_log_work(
    _auth: JwtAuth,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let task_id = path.into_inner();
    pool.get_task(task_id).await?;

    let entries = pool
        .list_log_work(task_id)
        .await?
        .into_iter()
        .map(LogWorkResponse::from)
        .collect();
    let total_hours = pool.total_hours_for_task(task_id).await?;

    Ok(HttpResponse::Ok().json(LogWorkListResponse {
        entries,
        total_hours,
    }))
}

/// Log time on a task as the caller.
///
/// POST /api/v1/tasks/{id}/log-work
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/log-work",
    tag = "Work Log",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = CreateLogWorkRequest,
    responses(
        (status = 201, description = "Entry recorded", body = LogWorkResponse),
        (status = 400, description = "Hours outside (0, 24]"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[post("/tasks/{id}/log-work")]
pub async fn create_log_work(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: web::Json<CreateLogWorkRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let task_id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;

    let entry = pool.create_log_work(task_id, auth.user_id(), &req).await?;
    info!(
        entry_id = entry.id,
        task_id,
        user_id = auth.user_id(),
        "Work logged"
    );

    Ok(HttpResponse::Created().json(LogWorkResponse::from(entry)))
}
