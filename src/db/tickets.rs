//! Database queries for tickets.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entity::ticket::{self, ActiveModel, Entity as Ticket};
use crate::entity::ticket_assignee::{self, Entity as TicketAssignee};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTicketRequest, ReviewDecision, TicketStatus};

use super::DbPool;
use super::tasks::ensure_users_exist;

impl DbPool {
    /// Raise a ticket on a task.
    pub async fn create_ticket(
        &self,
        task_id: i32,
        requested_by_id: i32,
        req: &CreateTicketRequest,
    ) -> AppResult<(ticket::Model, Vec<i32>)> {
        self.get_task(task_id).await?;

        let assignees: BTreeSet<i32> = req.assignee_ids.iter().copied().collect();
        let now = Utc::now();

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        ensure_users_exist(&txn, &assignees).await?;

        let model = ActiveModel {
            title: Set(req.title.trim().to_string()),
            description: Set(req.description.clone()),
            status: Set(Some(TicketStatus::Pending.as_str().to_string())),
            priority: Set(Some(req.priority.as_str().to_string())),
            task_id: Set(task_id),
            requested_by_id: Set(requested_by_id),
            approved_by_id: Set(None),
            requested_at: Set(Some(now)),
            approved_at: Set(None),
            notes: Set(req.notes.clone()),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        let ticket = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert ticket: {}", e)))?;

        if !assignees.is_empty() {
            let rows = assignees.iter().map(|&user_id| ticket_assignee::ActiveModel {
                ticket_id: Set(ticket.id),
                user_id: Set(user_id),
            });
            TicketAssignee::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to assign ticket: {}", e)))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit ticket: {}", e)))?;

        Ok((ticket, assignees.into_iter().collect()))
    }

    /// Get a ticket by ID or fail with `NotFound`.
    pub async fn get_ticket(&self, id: i32) -> AppResult<ticket::Model> {
        Ticket::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get ticket: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {}", id)))
    }

    /// Tickets raised on a task, newest first.
    pub async fn list_tickets_for_task(&self, task_id: i32) -> AppResult<Vec<ticket::Model>> {
        Ticket::find()
            .filter(ticket::Column::TaskId.eq(task_id))
            .order_by_desc(ticket::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list tickets: {}", e)))
    }

    /// Assignee ids for several tickets at once.
    pub async fn ticket_assignee_ids_for(
        &self,
        ticket_ids: &[i32],
    ) -> AppResult<HashMap<i32, Vec<i32>>> {
        if ticket_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = TicketAssignee::find()
            .filter(ticket_assignee::Column::TicketId.is_in(ticket_ids.iter().copied()))
            .order_by_asc(ticket_assignee::Column::UserId)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get ticket assignees: {}", e)))?;

        let mut by_ticket: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in rows {
            by_ticket.entry(row.ticket_id).or_default().push(row.user_id);
        }
        Ok(by_ticket)
    }

    /// Record an approval or rejection.
    ///
    /// Only an open ticket is updated; if another review landed first the
    /// call fails with `Conflict` and the earlier decision stands.
    pub async fn review_ticket(
        &self,
        id: i32,
        reviewer_id: i32,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> AppResult<ticket::Model> {
        let now = Utc::now();
        let open = [TicketStatus::Pending.as_str(), TicketStatus::InReview.as_str()];

        let mut update = Ticket::update_many()
            .col_expr(
                ticket::Column::Status,
                Expr::value(decision.status().as_str()),
            )
            .col_expr(ticket::Column::ApprovedById, Expr::value(reviewer_id))
            .col_expr(ticket::Column::ApprovedAt, Expr::value(now))
            .col_expr(ticket::Column::UpdatedAt, Expr::value(now));
        if let Some(notes) = notes {
            update = update.col_expr(ticket::Column::Notes, Expr::value(notes));
        }

        let result = update
            .filter(ticket::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(ticket::Column::Status.is_null())
                    .add(ticket::Column::Status.is_in(open)),
            )
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to review ticket: {}", e)))?;

        let ticket = self.get_ticket(id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Ticket {} is already {}",
                id,
                crate::models::ticket::status_of(&ticket)
            )));
        }
        Ok(ticket)
    }
}
