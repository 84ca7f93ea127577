//! Task models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{Pagination, PaginationParams, validate};
use crate::entity::task;
use crate::error::{AppError, AppResult};

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
    OnHold,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::OnHold => "on_hold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "on_hold" => Some(Self::OnHold),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority shared by tasks and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }
    validate::length("Title", title, 1, 255)
}

fn validate_hours(field: &str, hours: Option<i32>) -> AppResult<()> {
    match hours {
        Some(h) if h < 0 => Err(AppError::InvalidInput(format!(
            "{} must not be negative",
            field
        ))),
        _ => Ok(()),
    }
}

fn validate_dates(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> AppResult<()> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(AppError::InvalidInput(
            "End date must not be before start date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Request to create a task. The caller becomes its creator.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub notes: Option<String>,
    /// Users assigned to the task
    #[serde(default)]
    pub assignee_ids: Vec<i32>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_title(&self.title)?;
        validate_hours("Estimated hours", self.estimated_hours)?;
        validate_dates(self.start_date, self.end_date)
    }
}

/// Partial task update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    /// Percent complete, 0 to 100
    pub progress: Option<i32>,
    pub notes: Option<String>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate::optional(self.title.as_deref(), validate_title)?;
        validate_hours("Estimated hours", self.estimated_hours)?;
        validate_hours("Actual hours", self.actual_hours)?;
        if let Some(p) = self.progress {
            if !(0..=100).contains(&p) {
                return Err(AppError::InvalidInput(
                    "Progress must be between 0 and 100".to_string(),
                ));
            }
        }
        validate_dates(self.start_date, self.end_date)
    }
}

/// Replacement assignee set.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssigneesRequest {
    pub user_ids: Vec<i32>,
}

/// Query filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Substring of the legacy free-text assignee
    pub assignee: Option<String>,
    pub creator_id: Option<i32>,
    pub assignee_id: Option<i32>,
    pub deadline_before: Option<DateTime<Utc>>,
    /// Matches title or description
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl TaskFilters {
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
        })?;
        validate::optional(self.assignee.as_deref(), |v| {
            validate::length("Assignee", v, 1, 100)
        })
    }
}

/// Task as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Stored value; prototype rows may hold values outside the current set
    pub priority: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: i32,
    pub actual_hours: i32,
    pub progress: i32,
    pub notes: Option<String>,
    /// Free-text assignee from before assignment was normalized
    pub legacy_assignee: Option<String>,
    pub creator_id: Option<i32>,
    pub assignee_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    pub fn new(model: task::Model, assignee_ids: Vec<i32>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model
                .status
                .as_deref()
                .and_then(TaskStatus::parse)
                .unwrap_or_default(),
            priority: model.priority,
            start_date: model.start_date,
            end_date: model.end_date,
            deadline: model.deadline,
            estimated_hours: model.estimated_hours.unwrap_or(0),
            actual_hours: model.actual_hours.unwrap_or(0),
            progress: model.progress.unwrap_or(0),
            notes: model.notes,
            legacy_assignee: model.assignee,
            creator_id: model.creator_id,
            assignee_ids,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Paged task list.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    pub pagination: Pagination,
}
