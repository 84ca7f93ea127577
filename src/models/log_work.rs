//! Work log models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::log_work;
use crate::error::{AppError, AppResult};

/// Hours a single entry may record.
pub const MAX_HOURS_PER_ENTRY: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// Request to log time against a task. The caller is the worker.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLogWorkRequest {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub hours_worked: Decimal,
    pub description: Option<String>,
}

impl CreateLogWorkRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.hours_worked <= Decimal::ZERO || self.hours_worked > MAX_HOURS_PER_ENTRY {
            return Err(AppError::InvalidInput(
                "Hours worked must be greater than 0 and at most 24".to_string(),
            ));
        }
        if self.hours_worked.normalize().scale() > 2 {
            return Err(AppError::InvalidInput(
                "Hours worked allows at most two decimal places".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogWorkResponse {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub hours_worked: Decimal,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<log_work::Model> for LogWorkResponse {
    fn from(m: log_work::Model) -> Self {
        Self {
            id: m.id,
            task_id: m.task_id,
            user_id: m.user_id,
            date: m.date,
            hours_worked: m.hours_worked.unwrap_or_default(),
            description: m.description,
            created_at: m.created_at,
        }
    }
}

/// Entries for a task with their sum.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogWorkListResponse {
    pub entries: Vec<LogWorkResponse>,
    #[schema(value_type = String)]
    pub total_hours: Decimal,
}
