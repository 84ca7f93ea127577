//! Ticket models and the review workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::task::Priority;
use super::validate;
use crate::entity::ticket;
use crate::error::{AppError, AppResult};

/// Ticket review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    InReview,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::InReview => "in_review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "in_review" => Some(Self::InReview),
            _ => None,
        }
    }

    /// Still awaiting a decision.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InReview)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn status(&self) -> TicketStatus {
        match self {
            Self::Approve => TicketStatus::Approved,
            Self::Reject => TicketStatus::Rejected,
        }
    }
}

/// Admins may review any ticket; otherwise only the creator of its task.
pub fn can_review(reviewer_id: i32, reviewer_is_admin: bool, task_creator_id: Option<i32>) -> bool {
    reviewer_is_admin || task_creator_id == Some(reviewer_id)
}

/// Check a review can move a ticket from `current`.
pub fn check_transition(current: TicketStatus, decision: ReviewDecision) -> AppResult<TicketStatus> {
    if !current.is_open() {
        return Err(AppError::Conflict(format!(
            "Ticket is already {}",
            current
        )));
    }
    Ok(decision.status())
}

/// Request to raise a ticket on a task. The caller is the requester.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub notes: Option<String>,
    #[serde(default)]
    pub assignee_ids: Vec<i32>,
}

impl CreateTicketRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }
        validate::length("Title", &self.title, 1, 255)
    }
}

/// Optional reviewer note attached to an approval or rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewTicketRequest {
    pub notes: Option<String>,
}

/// Ticket as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub priority: Option<String>,
    pub task_id: i32,
    pub requested_by_id: i32,
    pub approved_by_id: Option<i32>,
    pub requested_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub assignee_ids: Vec<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TicketResponse {
    pub fn new(model: ticket::Model, assignee_ids: Vec<i32>) -> Self {
        let status = status_of(&model);
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            status,
            priority: model.priority,
            task_id: model.task_id,
            requested_by_id: model.requested_by_id,
            approved_by_id: model.approved_by_id,
            requested_at: model.requested_at,
            approved_at: model.approved_at,
            notes: model.notes,
            assignee_ids,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Status of a stored ticket. NULL reads as pending.
pub fn status_of(model: &ticket::Model) -> TicketStatus {
    model
        .status
        .as_deref()
        .and_then(TicketStatus::parse)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reviewer_rules() {
        assert!(can_review(1, true, None));
        assert!(can_review(7, false, Some(7)));
        assert!(!can_review(7, false, Some(8)));
        assert!(!can_review(7, false, None));
    }

    #[test]
    fn test_open_tickets_can_be_decided() {
        assert_eq!(
            check_transition(TicketStatus::Pending, ReviewDecision::Approve).unwrap(),
            TicketStatus::Approved
        );
        assert_eq!(
            check_transition(TicketStatus::InReview, ReviewDecision::Reject).unwrap(),
            TicketStatus::Rejected
        );
    }

    fn stored(status: Option<&str>) -> ticket::Model {
        ticket::Model {
            id: 3,
            title: "Extend deadline".to_string(),
            description: Some("Blocked on review".to_string()),
            status: status.map(str::to_string),
            priority: Some("high".to_string()),
            task_id: 9,
            requested_by_id: 4,
            approved_by_id: None,
            requested_at: None,
            approved_at: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_response_carries_stored_status() {
        let resp = TicketResponse::new(stored(Some("in_review")), vec![4, 5]);
        assert_eq!(resp.status, TicketStatus::InReview);
        assert_eq!(resp.description.as_deref(), Some("Blocked on review"));
        assert_eq!(resp.assignee_ids, vec![4, 5]);

        let legacy = TicketResponse::new(stored(None), vec![]);
        assert_eq!(legacy.status, TicketStatus::Pending);
    }

    #[test]
    fn test_decided_tickets_are_final() {
        let err = check_transition(TicketStatus::Approved, ReviewDecision::Reject).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(check_transition(TicketStatus::Rejected, ReviewDecision::Approve).is_err());
    }
}
