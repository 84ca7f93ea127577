//! User management endpoints.

use actix_web::{HttpResponse, delete, get, post, put, web};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::{JwtAuth, hash_password};
use crate::db::DbPool;
use crate::db::users::NewUser;
use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateUserRequest, Pagination, SearchQuery, UpdateUserRequest, UserFilters, UserListResponse,
    UserResponse, UserStats,
};

use super::auth::MessageResponse;

/// Configure user routes. Fixed paths go before `/users/{id}`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(search_users)
        .service(user_stats)
        .service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteUserQuery {
    /// Remove the row instead of deactivating it
    #[serde(default)]
    pub hard: bool,
}

async fn list_response(
    pool: &DbPool,
    filters: &UserFilters,
    rows: Vec<user::Model>,
    total: u64,
) -> AppResult<UserListResponse> {
    let roles = pool.role_names().await?;
    let users = rows
        .into_iter()
        .map(|u| {
            let role = roles.get(&u.role_id).copied().unwrap_or_default();
            UserResponse::new(u, role)
        })
        .collect();

    let page = filters.pagination();
    Ok(UserListResponse {
        users,
        pagination: Pagination::new(page.page(), page.limit(), total),
    })
}

/// List users.
///
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(UserFilters),
    responses(
        (status = 200, description = "Page of users", body = UserListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/users")]
pub async fn list_users(
    _auth: JwtAuth,
    query: web::Query<UserFilters>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let filters = query.into_inner();
    filters.validate()?;

    let (rows, total) = pool.list_users(&filters).await?;
    let response = list_response(&pool, &filters, rows, total).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Search users by email, username or full name.
///
/// GET /api/v1/users/search
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    tag = "Users",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users", body = UserListResponse),
        (status = 400, description = "Missing or invalid query"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/users/search")]
pub async fn search_users(
    _auth: JwtAuth,
    query: web::Query<SearchQuery>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    query.validate()?;
    let filters = query.into_filters();

    let (rows, total) = pool.list_users(&filters).await?;
    let response = list_response(&pool, &filters, rows, total).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// User counts.
///
/// GET /api/v1/users/stats
#[utoipa::path(
    get,
    path = "/api/v1/users/stats",
    tag = "Users",
    responses(
        (status = 200, description = "User statistics", body = UserStats),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/users/stats")]
pub async fn user_stats(_auth: JwtAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.user_stats().await?))
}

/// Get a single user.
///
/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/users/{id}")]
pub async fn get_user(
    _auth: JwtAuth,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let user = pool.get_user(path.into_inner()).await?;
    let role = pool.role_name(user.role_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse::new(user, role)))
}

/// Create a user with any role.
///
/// POST /api/v1/users
/// Authorization: admin
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[post("/users")]
pub async fn create_user(
    auth: JwtAuth,
    body: web::Json<CreateUserRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let req = body.into_inner();
    req.validate()?;

    let role = req.role;
    let password_hash = hash_password(SecretString::from(req.password)).await?;
    let user = pool
        .create_user(NewUser {
            email: req.email,
            password_hash,
            username: req.username,
            full_name: req.full_name,
            phone: req.phone,
            department: req.department,
            position: req.position,
            role,
        })
        .await?;

    info!(user_id = user.id, created_by = auth.user_id(), role = %role, "User created");

    Ok(HttpResponse::Created().json(UserResponse::new(user, role)))
}

/// Update a user.
///
/// PUT /api/v1/users/{id}
/// Authorization: admin, or the user themself for profile fields
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not allowed to change this user or field"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[put("/users/{id}")]
pub async fn update_user(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    if !auth.is_admin() && !(id == auth.user_id() && req.is_self_service()) {
        return Err(AppError::Forbidden(
            "Admin role required to change other users, roles or status".to_string(),
        ));
    }

    req.validate()?;

    let password_hash = match req.password.clone() {
        Some(p) => Some(hash_password(SecretString::from(p)).await?),
        None => None,
    };

    let user = pool.update_user(id, &req, password_hash).await?;
    let role = pool.role_name(user.role_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse::new(user, role)))
}

/// Deactivate or delete a user.
///
/// DELETE /api/v1/users/{id}
/// Authorization: admin
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = i32, Path, description = "User ID"),
        DeleteUserQuery
    ),
    responses(
        (status = 200, description = "User deactivated or deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete yourself"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still referenced")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    auth: JwtAuth,
    path: web::Path<i32>,
    query: web::Query<DeleteUserQuery>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    if id == auth.user_id() {
        return Err(AppError::InvalidInput(
            "Cannot delete your own account".to_string(),
        ));
    }

    let message = if query.hard {
        pool.delete_user(id).await?;
        info!(user_id = id, deleted_by = auth.user_id(), "User deleted");
        "User deleted"
    } else {
        pool.deactivate_user(id).await?;
        info!(user_id = id, deleted_by = auth.user_id(), "User deactivated");
        "User deactivated"
    };

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: message.to_string(),
    }))
}
