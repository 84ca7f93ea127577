//! Task endpoints.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::JwtAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AssigneesRequest, CreateTaskRequest, Pagination, TaskFilters, TaskListResponse, TaskResponse,
    UpdateTaskRequest,
};

/// Configure task routes. Fixed paths go before `/tasks/{id}`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(search_tasks)
        .service(list_tasks)
        .service(create_task)
        .service(get_task)
        .service(update_task)
        .service(delete_task)
        .service(replace_assignees);
}

/// Free-text task search.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TaskSearchQuery {
    pub q: String,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

async fn list_response(
    pool: &DbPool,
    filters: &TaskFilters,
) -> AppResult<TaskListResponse> {
    let (rows, total) = pool.list_tasks(filters).await?;

    let ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
    let mut assignees = pool.task_assignee_ids_for(&ids).await?;

    let tasks = rows
        .into_iter()
        .map(|t| {
            let ids = assignees.remove(&t.id).unwrap_or_default();
            TaskResponse::new(t, ids)
        })
        .collect();

    let page = filters.pagination();
    Ok(TaskListResponse {
        tasks,
        pagination: Pagination::new(page.page(), page.limit(), total),
    })
}

/// List tasks.
///
/// GET /api/v1/tasks
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "Tasks",
    params(TaskFilters),
    responses(
        (status = 200, description = "Page of tasks", body = TaskListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/tasks")]
pub async fn list_tasks(
    _auth: JwtAuth,
    query: web::Query<TaskFilters>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let filters = query.into_inner();
    filters.validate()?;

    Ok(HttpResponse::Ok().json(list_response(&pool, &filters).await?))
}

/// Search tasks by title or description.
///
/// GET /api/v1/tasks/search
#[utoipa::path(
    get,
    path = "/api/v1/tasks/search",
    tag = "Tasks",
    params(TaskSearchQuery),
    responses(
        (status = 200, description = "Matching tasks", body = TaskListResponse),
        (status = 400, description = "Missing or invalid query"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/tasks/search")]
pub async fn search_tasks(
    _auth: JwtAuth,
    query: web::Query<TaskSearchQuery>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    if query.q.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query is required".to_string(),
        ));
    }

    let filters = TaskFilters {
        search: Some(query.q),
        page: query.page,
        limit: query.limit,
        ..Default::default()
    };
    filters.validate()?;

    Ok(HttpResponse::Ok().json(list_response(&pool, &filters).await?))
}

/// Create a task owned by the caller.
///
/// POST /api/v1/tasks
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "Tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid input or unknown assignee"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[post("/tasks")]
pub async fn create_task(
    auth: JwtAuth,
    body: web::Json<CreateTaskRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let (task, assignee_ids) = pool.create_task(auth.user_id(), &req).await?;
    info!(task_id = task.id, creator_id = auth.user_id(), "Task created");

    Ok(HttpResponse::Created().json(TaskResponse::new(task, assignee_ids)))
}

/// Get a task with its assignees.
///
/// GET /api/v1/tasks/{id}
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = TaskResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/tasks/{id}")]
pub async fn get_task(
    _auth: JwtAuth,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let task = pool.get_task(id).await?;
    let assignee_ids = pool.task_assignee_ids(id).await?;

    Ok(HttpResponse::Ok().json(TaskResponse::new(task, assignee_ids)))
}

/// Update a task.
///
/// PUT /api/v1/tasks/{id}
/// Authorization: admin or the task's creator
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[put("/tasks/{id}")]
pub async fn update_task(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: web::Json<UpdateTaskRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;

    let existing = pool.get_task(id).await?;
    auth.require_admin_or(existing.creator_id)?;

    let task = pool.update_task(id, &req).await?;
    let assignee_ids = pool.task_assignee_ids(id).await?;

    Ok(HttpResponse::Ok().json(TaskResponse::new(task, assignee_ids)))
}

/// Delete a task.
///
/// DELETE /api/v1/tasks/{id}
/// Authorization: admin or the task's creator
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task has tickets or work logs")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[delete("/tasks/{id}")]
pub async fn delete_task(
    auth: JwtAuth,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let existing = pool.get_task(id).await?;
    auth.require_admin_or(existing.creator_id)?;

    pool.delete_task(id).await?;
    info!(task_id = id, deleted_by = auth.user_id(), "Task deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Replace the assignees of a task.
///
/// PUT /api/v1/tasks/{id}/assignees
/// Authorization: admin or the task's creator
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}/assignees",
    tag = "Tasks",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = AssigneesRequest,
    responses(
        (status = 200, description = "Assignees replaced", body = TaskResponse),
        (status = 400, description = "Unknown user id"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[put("/tasks/{id}/assignees")]
pub async fn replace_assignees(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: web::Json<AssigneesRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let existing = pool.get_task(id).await?;
    auth.require_admin_or(existing.creator_id)?;

    let assignee_ids = pool.replace_task_assignees(id, &body.user_ids).await?;
    let task = pool.get_task(id).await?;

    Ok(HttpResponse::Ok().json(TaskResponse::new(task, assignee_ids)))
}
