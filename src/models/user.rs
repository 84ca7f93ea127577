//! User models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{Pagination, PaginationParams, validate};
use crate::entity::user;
use crate::error::{AppError, AppResult};

/// Role names accepted by the `roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Admin,
    #[default]
    User,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Status of a stored row. A NULL status predates the column default.
    pub fn of(model: &user::Model) -> Self {
        model
            .status
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name shown for a user: full name, then username, then email.
pub fn display_name(model: &user::Model) -> String {
    [&model.full_name, &model.username]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(model.email.as_str())
        .to_string()
}

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub display_name: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: RoleName,
    pub status: UserStatus,
    pub total_orders: i32,
    #[schema(value_type = String)]
    pub total_spending: Decimal,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserResponse {
    pub fn new(model: user::Model, role: RoleName) -> Self {
        Self {
            display_name: display_name(&model),
            status: UserStatus::of(&model),
            id: model.id,
            email: model.email,
            username: model.username,
            full_name: model.full_name,
            avatar: model.avatar,
            phone: model.phone,
            department: model.department,
            position: model.position,
            role,
            total_orders: model.total_orders.unwrap_or(0),
            total_spending: model.total_spending.unwrap_or_default(),
            last_login_at: model.last_login_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Request to create a user (admin only).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[serde(default)]
    pub role: RoleName,
}

impl CreateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate::email(&self.email)?;
        validate::password(&self.password)?;
        validate_profile(
            self.username.as_deref(),
            self.full_name.as_deref(),
            self.phone.as_deref(),
            self.department.as_deref(),
            self.position.as_deref(),
        )
    }
}

/// Partial user update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub status: Option<UserStatus>,
    pub role: Option<RoleName>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate::optional(self.email.as_deref(), validate::email)?;
        validate::optional(self.password.as_deref(), validate::password)?;
        validate_profile(
            self.username.as_deref(),
            self.full_name.as_deref(),
            self.phone.as_deref(),
            self.department.as_deref(),
            self.position.as_deref(),
        )
    }

    /// Fields a user may change on their own account.
    pub fn is_self_service(&self) -> bool {
        self.status.is_none() && self.role.is_none()
    }
}

fn validate_profile(
    username: Option<&str>,
    full_name: Option<&str>,
    phone: Option<&str>,
    department: Option<&str>,
    position: Option<&str>,
) -> AppResult<()> {
    validate::optional(username, |v| validate::length("Username", v, 2, 30))?;
    validate::optional(full_name, |v| validate::length("Full name", v, 2, 100))?;
    validate::optional(phone, validate::phone)?;
    validate::optional(department, |v| validate::length("Department", v, 2, 50))?;
    validate::optional(position, |v| validate::length("Position", v, 2, 50))
}

/// Query filters for listing users.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct UserFilters {
    pub role: Option<RoleName>,
    pub status: Option<UserStatus>,
    /// Matches email, username or full name
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl UserFilters {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.pagination().validate()?;
        validate::optional(self.search.as_deref(), |v| {
            validate::length("Search term", v, 1, 100)
        })
    }
}

/// Free-text user search.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct SearchQuery {
    pub q: String,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl SearchQuery {
    pub fn validate(&self) -> AppResult<()> {
        if self.q.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query is required".to_string(),
            ));
        }
        validate::length("Search query", &self.q, 1, 100)?;
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
        .validate()
    }

    pub fn into_filters(self) -> UserFilters {
        UserFilters {
            search: Some(self.q),
            page: self.page,
            limit: self.limit,
            ..Default::default()
        }
    }
}

/// Paged user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// Aggregate user counts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
    /// Created in the last 30 days
    pub recent: u64,
}
