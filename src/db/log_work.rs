//! Database queries for work log entries.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::entity::log_work::{self, ActiveModel, Entity as LogWork};
use crate::error::{AppError, AppResult};
use crate::models::CreateLogWorkRequest;

use super::DbPool;

impl DbPool {
    /// Insert a work log entry for `user_id` on a task.
    pub async fn create_log_work(
        &self,
        task_id: i32,
        user_id: i32,
        req: &CreateLogWorkRequest,
    ) -> AppResult<log_work::Model> {
        self.get_task(task_id).await?;
        let now = Utc::now();

        let model = ActiveModel {
            task_id: Set(task_id),
            user_id: Set(user_id),
            date: Set(req.date),
            hours_worked: Set(Some(req.hours_worked)),
            description: Set(req.description.clone()),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert work log: {}", e)))
    }

    /// Entries for a task, most recent work date first.
    pub async fn list_log_work(&self, task_id: i32) -> AppResult<Vec<log_work::Model>> {
        LogWork::find()
            .filter(log_work::Column::TaskId.eq(task_id))
            .order_by_desc(log_work::Column::Date)
            .order_by_desc(log_work::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list work logs: {}", e)))
    }

    /// Sum of hours logged on a task.
    pub async fn total_hours_for_task(&self, task_id: i32) -> AppResult<Decimal> {
        let total: Option<Option<Decimal>> = LogWork::find()
            .select_only()
            .column_as(Expr::cust(r#"COALESCE(SUM("hours_worked"), 0)"#), "total")
            .filter(log_work::Column::TaskId.eq(task_id))
            .into_tuple()
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to sum work logs: {}", e)))?;

        Ok(total.flatten().unwrap_or_default())
    }
}
