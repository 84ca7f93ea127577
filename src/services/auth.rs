//! Account authentication routes.
//!
//! Sessions are stateless HS256 bearer tokens:
//! 1. POST /auth/register: create a `user` account
//! 2. POST /auth/login: verify credentials, issue a token
//! 3. POST /auth/logout: acknowledge; the client discards its token
//! 4. GET /auth/me: the caller's account

use actix_web::{HttpResponse, get, post, web};
use secrecy::SecretString;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{JwtAuth, burn_password_check, create_token, hash_password, verify_password};
use crate::config::Config;
use crate::db::DbPool;
use crate::db::users::NewUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, RoleName, UserResponse, UserStatus,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Configure authentication routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(get_current_user);
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new account.
///
/// POST /api/v1/auth/register
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
#[post("/auth/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let password_hash = hash_password(SecretString::from(req.password)).await?;

    let user = pool
        .create_user(NewUser {
            email: req.email,
            password_hash,
            username: req.username,
            full_name: req.full_name,
            role: RoleName::User,
            ..Default::default()
        })
        .await?;

    info!(user_id = user.id, "Account registered");

    Ok(HttpResponse::Created().json(UserResponse::new(user, RoleName::User)))
}

/// Log in with email and password.
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
#[post("/auth/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let Some(user) = pool.find_user_by_email(&req.email).await? else {
        burn_password_check(SecretString::from(req.password)).await;
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let valid = verify_password(SecretString::from(req.password), user.password.clone()).await?;
    if !valid {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let status = UserStatus::of(&user);
    if status != UserStatus::Active {
        return Err(AppError::Unauthorized(format!("Account is {}", status)));
    }

    let role = pool.role_name(user.role_id).await?;
    let token = create_token(&user, role, &config.jwt)?;
    pool.touch_last_login(user.id).await?;

    info!(user_id = user.id, "User logged in");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: config.jwt.ttl_secs,
        user: UserResponse::new(user, role),
    }))
}

/// Log out. Tokens are not tracked server-side.
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    )
)]
#[post("/auth/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

/// Get the authenticated caller.
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/auth/me")]
pub async fn get_current_user(auth: JwtAuth) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::new(auth.user, auth.role))
}
