//! Request, response and domain types for the tasktrack API.

use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub mod auth;
pub mod log_work;
pub mod task;
pub mod ticket;
pub mod user;
pub mod validate;

// Re-export commonly used types
pub use auth::{Claims, LoginRequest, LoginResponse, RegisterRequest};
pub use log_work::{CreateLogWorkRequest, LogWorkListResponse, LogWorkResponse};
pub use task::{
    AssigneesRequest, CreateTaskRequest, Priority, TaskFilters, TaskListResponse, TaskResponse,
    TaskStatus, UpdateTaskRequest,
};
pub use ticket::{
    CreateTicketRequest, ReviewDecision, ReviewTicketRequest, TicketResponse, TicketStatus,
};
pub use user::{
    CreateUserRequest, RoleName, SearchQuery, UpdateUserRequest, UserFilters, UserListResponse,
    UserResponse, UserStats, UserStatus,
};

/// Largest page size a list endpoint returns.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Page size when none is requested.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Largest row offset a query may bind. PostgreSQL takes OFFSET as a bigint.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Pagination parameters.
#[derive(Debug, Clone, Default, serde::Deserialize, ToSchema, IntoParams)]
pub struct PaginationParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, 1 to 100
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Reject out-of-range values instead of silently clamping them.
    pub fn validate(&self) -> AppResult<()> {
        if self.page == Some(0) {
            return Err(AppError::InvalidInput(
                "Page must be greater than 0".to_string(),
            ));
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_PAGE_LIMIT {
                return Err(AppError::InvalidInput(
                    "Limit must be between 1 and 100".to_string(),
                ));
            }
        }
        let in_range = (self.page() - 1)
            .checked_mul(self.limit())
            .is_some_and(|offset| offset <= MAX_OFFSET);
        if !in_range {
            return Err(AppError::InvalidInput("Page is out of range".to_string()));
        }
        Ok(())
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit())
            .min(MAX_OFFSET)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}
