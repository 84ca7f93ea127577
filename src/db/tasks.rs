//! Database queries for tasks and their assignees.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::entity::task::{self, ActiveModel, Entity as Task};
use crate::entity::task_assignee::{self, Entity as TaskAssignee};
use crate::entity::user::{self, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTaskRequest, TaskFilters, UpdateTaskRequest};

use super::DbPool;

/// Fail with `InvalidInput` unless every id names an existing user.
pub(crate) async fn ensure_users_exist<C: ConnectionTrait>(
    conn: &C,
    ids: &BTreeSet<i32>,
) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i32> = User::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Id.is_in(ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up users: {}", e)))?;

    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Unknown user id(s): {}",
            missing.join(", ")
        )))
    }
}

async fn insert_assignees<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    user_ids: &BTreeSet<i32>,
) -> Result<(), DbErr> {
    if user_ids.is_empty() {
        return Ok(());
    }

    let rows = user_ids.iter().map(|&user_id| task_assignee::ActiveModel {
        task_id: Set(task_id),
        user_id: Set(user_id),
    });
    TaskAssignee::insert_many(rows).exec(conn).await?;
    Ok(())
}

impl DbPool {
    /// Insert a task with `creator_id` as its creator, plus its assignees.
    pub async fn create_task(
        &self,
        creator_id: i32,
        req: &CreateTaskRequest,
    ) -> AppResult<(task::Model, Vec<i32>)> {
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
            status: Set(Some(req.status.as_str().to_string())),
            priority: Set(req.priority.as_str().to_string()),
            start_date: Set(req.start_date),
            end_date: Set(req.end_date),
            deadline: Set(req.deadline),
            estimated_hours: Set(Some(req.estimated_hours.unwrap_or(0))),
            actual_hours: Set(Some(0)),
            progress: Set(Some(0)),
            notes: Set(req.notes.clone()),
            assignee: Set(None),
            creator_id: Set(Some(creator_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let task = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert task: {}", e)))?;

        insert_assignees(&txn, task.id, &assignees)
            .await
            .map_err(|e| AppError::Database(format!("Failed to assign task: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit task: {}", e)))?;

        Ok((task, assignees.into_iter().collect()))
    }

    /// Get a task by ID or fail with `NotFound`.
    pub async fn get_task(&self, id: i32) -> AppResult<task::Model> {
        Task::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get task: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Task {}", id)))
    }

    /// User ids assigned to a task, ascending.
    pub async fn task_assignee_ids(&self, task_id: i32) -> AppResult<Vec<i32>> {
        let mut by_task = self.task_assignee_ids_for(&[task_id]).await?;
        Ok(by_task.remove(&task_id).unwrap_or_default())
    }

    /// Assignee ids for several tasks at once.
    pub async fn task_assignee_ids_for(&self, task_ids: &[i32]) -> AppResult<HashMap<i32, Vec<i32>>> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = TaskAssignee::find()
            .filter(task_assignee::Column::TaskId.is_in(task_ids.iter().copied()))
            .order_by_asc(task_assignee::Column::UserId)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get task assignees: {}", e)))?;

        let mut by_task: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in rows {
            by_task.entry(row.task_id).or_default().push(row.user_id);
        }
        Ok(by_task)
    }

    /// List tasks with optional filtering, newest first.
    pub async fn list_tasks(&self, filters: &TaskFilters) -> AppResult<(Vec<task::Model>, u64)> {
        let mut select = Task::find();

        if let Some(status) = filters.status {
            select = select.filter(task::Column::Status.eq(status.as_str()));
        }

        if let Some(priority) = filters.priority {
            select = select.filter(task::Column::Priority.eq(priority.as_str()));
        }

        if let Some(ref assignee) = filters.assignee {
            select = select.filter(Expr::cust_with_values(
                r#""task"."assignee" ILIKE $1"#,
                [format!("%{}%", assignee.trim())],
            ));
        }

        if let Some(creator_id) = filters.creator_id {
            select = select.filter(task::Column::CreatorId.eq(creator_id));
        }

        if let Some(assignee_id) = filters.assignee_id {
            select = select.filter(Expr::cust_with_values(
                r#""task"."id" IN (SELECT "task_id" FROM "task_assignees" WHERE "user_id" = $1)"#,
                [assignee_id],
            ));
        }

        if let Some(before) = filters.deadline_before {
            select = select.filter(task::Column::Deadline.lt(before));
        }

        if let Some(ref term) = filters.search {
            let pattern = format!("%{}%", term.trim());
            select = select.filter(
                Condition::any()
                    .add(Expr::cust_with_values(
                        r#""task"."title" ILIKE $1"#,
                        [pattern.clone()],
                    ))
                    .add(Expr::cust_with_values(
                        r#""task"."description" ILIKE $1"#,
                        [pattern],
                    )),
            );
        }

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count tasks: {}", e)))?;

        let page = filters.pagination();
        let tasks = select
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list tasks: {}", e)))?;

        Ok((tasks, total))
    }

    /// Apply a partial update.
    pub async fn update_task(&self, id: i32, req: &UpdateTaskRequest) -> AppResult<task::Model> {
        let existing = self.get_task(id).await?;

        // Dates only partially supplied are checked against the stored half
        let start = req.start_date.or(existing.start_date);
        let end = req.end_date.or(existing.end_date);
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(AppError::InvalidInput(
                    "End date must not be before start date".to_string(),
                ));
            }
        }

        let mut active: ActiveModel = existing.into();
        if let Some(ref title) = req.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(ref v) = req.description {
            active.description = Set(Some(v.clone()));
        }
        if let Some(status) = req.status {
            active.status = Set(Some(status.as_str().to_string()));
        }
        if let Some(priority) = req.priority {
            active.priority = Set(priority.as_str().to_string());
        }
        if req.start_date.is_some() {
            active.start_date = Set(req.start_date);
        }
        if req.end_date.is_some() {
            active.end_date = Set(req.end_date);
        }
        if req.deadline.is_some() {
            active.deadline = Set(req.deadline);
        }
        if req.estimated_hours.is_some() {
            active.estimated_hours = Set(req.estimated_hours);
        }
        if req.actual_hours.is_some() {
            active.actual_hours = Set(req.actual_hours);
        }
        if req.progress.is_some() {
            active.progress = Set(req.progress);
        }
        if let Some(ref v) = req.notes {
            active.notes = Set(Some(v.clone()));
        }
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update task: {}", e)))
    }

    /// Delete a task. Assignments go with it; tickets and work logs block it.
    pub async fn delete_task(&self, id: i32) -> AppResult<()> {
        let result = Task::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(format!(
                    "Task {} has tickets or work logs",
                    id
                )),
                _ => AppError::Database(format!("Failed to delete task: {}", e)),
            })?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Task {}", id)));
        }
        Ok(())
    }

    /// Replace the full assignee set of a task.
    pub async fn replace_task_assignees(&self, task_id: i32, user_ids: &[i32]) -> AppResult<Vec<i32>> {
        let assignees: BTreeSet<i32> = user_ids.iter().copied().collect();

        self.get_task(task_id).await?;

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        ensure_users_exist(&txn, &assignees).await?;

        TaskAssignee::delete_many()
            .filter(task_assignee::Column::TaskId.eq(task_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to clear task assignees: {}", e)))?;

        insert_assignees(&txn, task_id, &assignees)
            .await
            .map_err(|e| AppError::Database(format!("Failed to assign task: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit assignees: {}", e)))?;

        Ok(assignees.into_iter().collect())
    }
}
