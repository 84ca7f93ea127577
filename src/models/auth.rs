//! Authentication request, response and token types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserResponse;
use super::validate;
use crate::error::AppResult;

/// Issuer written to and required in every token.
pub const TOKEN_ISSUER: &str = "tasktrack";

/// Self-service registration. New accounts always get the `user` role.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate::email(&self.email)?;
        validate::password(&self.password)?;
        validate::optional(self.username.as_deref(), |v| {
            validate::length("Username", v, 2, 30)
        })?;
        validate::optional(self.full_name.as_deref(), |v| {
            validate::length("Full name", v, 2, 100)
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate::email(&self.email)?;
        validate::password(&self.password)
    }
}

/// Issued bearer token and the account it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Session JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iss: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "new@example.com".to_string(),
            password: "secret1".to_string(),
            username: None,
            full_name: Some("N".to_string()),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_ignores_role_field() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"x@example.com","password":"secret1","role":"admin"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_claims_user_id() {
        let claims = Claims {
            sub: "42".to_string(),
            email: "a@example.com".to_string(),
            role: "user".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.user_id(), Some(42));
    }
}
