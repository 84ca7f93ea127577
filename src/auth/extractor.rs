//! Actix-web extractor for bearer token authentication.
//!
//! The token only identifies the caller. The user row is loaded on every
//! request so role changes and deactivation take effect immediately.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use super::verify_token;
use crate::config::Config;
use crate::db::DbPool;
use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::{RoleName, UserStatus};

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

/// Extractor that requires a valid session token for an active user.
///
/// ```ignore
/// async fn protected_handler(auth: JwtAuth) -> impl Responder {
///     // auth.user is the caller's current row
/// }
/// ```
pub struct JwtAuth {
    pub user: user::Model,
    pub role: RoleName,
}

impl JwtAuth {
    pub fn user_id(&self) -> i32 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.role == RoleName::Admin
    }

    /// Fail with `Forbidden` unless the caller is an admin.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Fail with `Forbidden` unless the caller is an admin or `owner_id`.
    pub fn require_admin_or(&self, owner_id: Option<i32>) -> AppResult<()> {
        if self.is_admin() || owner_id == Some(self.user.id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only an admin or the owner may do this".to_string(),
            ))
        }
    }
}

impl FromRequest for JwtAuth {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let config = req.app_data::<web::Data<Config>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let (pool, config) = match (pool, config) {
                (Some(pool), Some(config)) => (pool, config),
                _ => {
                    return Err(AppError::Internal(
                        "Authentication is not configured".to_string(),
                    ));
                }
            };

            let token = token.ok_or_else(|| {
                AppError::Unauthorized(
                    "Missing bearer token. Provide an Authorization header.".to_string(),
                )
            })?;

            let claims =
                verify_token(&token, &config.jwt.secret).map_err(AppError::Unauthorized)?;

            let user_id = claims
                .user_id()
                .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))?;

            let user = pool
                .find_user_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

            if UserStatus::of(&user) != UserStatus::Active {
                return Err(AppError::Unauthorized("Account is not active".to_string()));
            }

            let role = pool.role_name(user.role_id).await?;

            Ok(JwtAuth { user, role })
        })
    }
}
