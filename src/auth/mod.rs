//! Authentication: password hashing, session tokens and the request extractor.

mod extractor;

use std::sync::LazyLock;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::config::JwtConfig;
use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::auth::TOKEN_ISSUER;
use crate::models::{Claims, RoleName};

pub use extractor::{JwtAuth, bearer_token};

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password on the blocking pool.
pub async fn hash_password(password: SecretString) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Check a password against a stored hash.
///
/// A stored value that is not a bcrypt hash never verifies.
pub async fn verify_password(password: SecretString, hash: String) -> AppResult<bool> {
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password.expose_secret(), &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    match result {
        Ok(valid) => Ok(valid),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            Ok(false)
        }
    }
}

/// Hash checked when a login names no account. Computed on first use.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("tasktrack-unknown-account", BCRYPT_COST).ok());

/// Spend the same bcrypt work as a real password check. Logins for unknown
/// emails call this so response time does not reveal registered emails.
pub async fn burn_password_check(password: SecretString) {
    let _ = tokio::task::spawn_blocking(move || {
        DUMMY_HASH
            .as_deref()
            .map(|hash| bcrypt::verify(password.expose_secret(), hash))
    })
    .await;
}

/// Issue a session token for a user.
pub fn create_token(user: &user::Model, role: RoleName, jwt: &JwtConfig) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(jwt.ttl_secs as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: role.as_str().to_string(),
        iss: TOKEN_ISSUER.to_string(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    let key = EncodingKey::from_secret(jwt.secret.expose_secret().as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AppError::Internal(format!("Failed to create access token: {}", e)))
}

/// Verify a session token and return its claims.
pub fn verify_token(token: &str, secret: &SecretString) -> Result<Claims, String> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.validate_aud = false;

    let token_data =
        decode::<Claims>(token, &key, &validation).map_err(|e| format!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}
