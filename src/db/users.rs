//! Database queries for users.

use chrono::{Duration, Utc};
use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::entity::user::{self, ActiveModel, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::{RoleName, UpdateUserRequest, UserFilters, UserStats, UserStatus};

use super::DbPool;

/// Fields for a new user row. The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: RoleName,
}

/// Emails are stored trimmed and lowercased. Lookups also lowercase the
/// stored value since prototype rows were written as entered.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_matches(email: &str) -> impl IntoCondition {
    Expr::cust_with_values(r#"LOWER("user"."email") = $1"#, [normalize_email(email)])
}

fn search_condition(term: &str) -> Condition {
    let pattern = format!("%{}%", term.trim());
    Condition::any()
        .add(Expr::cust_with_values(
            r#""user"."email" ILIKE $1"#,
            [pattern.clone()],
        ))
        .add(Expr::cust_with_values(
            r#""user"."username" ILIKE $1"#,
            [pattern.clone()],
        ))
        .add(Expr::cust_with_values(
            r#""user"."full_name" ILIKE $1"#,
            [pattern],
        ))
}

impl DbPool {
    /// Insert a new user.
    pub async fn create_user(&self, new: NewUser) -> AppResult<user::Model> {
        let email = normalize_email(&new.email);
        if self.email_exists(&email, None).await? {
            return Err(AppError::Conflict(format!("Email {} is already registered", email)));
        }

        let role = self.find_role_by_name(new.role).await?;
        let now = Utc::now();

        let model = ActiveModel {
            email: Set(email),
            password: Set(new.password_hash),
            role_id: Set(role.id),
            username: Set(new.username),
            full_name: Set(new.full_name),
            phone: Set(new.phone),
            department: Set(new.department),
            position: Set(new.position),
            status: Set(Some(UserStatus::Active.as_str().to_string())),
            total_orders: Set(Some(0)),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        model.insert(self.connection()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email is already registered".to_string())
            }
            _ => AppError::Database(format!("Failed to insert user: {}", e)),
        })
    }

    /// Get a user by ID.
    pub async fn find_user_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))
    }

    /// Get a user by ID or fail with `NotFound`.
    pub async fn get_user(&self, id: i32) -> AppResult<user::Model> {
        self.find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
    }

    /// Get a user by email.
    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(email_matches(email))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user by email: {}", e)))
    }

    /// Whether another user already has this email.
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let mut select = User::find().filter(email_matches(email));
        if let Some(id) = exclude_id {
            select = select.filter(user::Column::Id.ne(id));
        }

        let count = select
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check email: {}", e)))?;

        Ok(count > 0)
    }

    /// Apply a partial update. `password_hash` replaces the stored hash when set.
    pub async fn update_user(
        &self,
        id: i32,
        req: &UpdateUserRequest,
        password_hash: Option<String>,
    ) -> AppResult<user::Model> {
        let existing = self.get_user(id).await?;

        if let Some(ref email) = req.email {
            if self.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Email {} is already registered",
                    normalize_email(email)
                )));
            }
        }

        let role_id = match req.role {
            Some(role) => Some(self.find_role_by_name(role).await?.id),
            None => None,
        };

        let mut active: ActiveModel = existing.into();
        if let Some(ref email) = req.email {
            active.email = Set(normalize_email(email));
        }
        if let Some(hash) = password_hash {
            active.password = Set(hash);
        }
        if let Some(ref v) = req.username {
            active.username = Set(Some(v.clone()));
        }
        if let Some(ref v) = req.full_name {
            active.full_name = Set(Some(v.clone()));
        }
        if let Some(ref v) = req.avatar {
            active.avatar = Set(Some(v.clone()));
        }
        if let Some(ref v) = req.phone {
            active.phone = Set(Some(v.clone()));
        }
        if let Some(ref v) = req.department {
            active.department = Set(Some(v.clone()));
        }
        if let Some(ref v) = req.position {
            active.position = Set(Some(v.clone()));
        }
        if let Some(status) = req.status {
            active.status = Set(Some(status.as_str().to_string()));
        }
        if let Some(role_id) = role_id {
            active.role_id = Set(role_id);
        }
        active.updated_at = Set(Some(Utc::now()));

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))
    }

    /// Mark a user inactive. Their rows stay referenced.
    pub async fn deactivate_user(&self, id: i32) -> AppResult<user::Model> {
        let existing = self.get_user(id).await?;

        let mut active: ActiveModel = existing.into();
        active.status = Set(Some(UserStatus::Inactive.as_str().to_string()));
        active.updated_at = Set(Some(Utc::now()));

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to deactivate user: {}", e)))
    }

    /// Delete a user row. Fails with `Conflict` while tasks, tickets or work
    /// logs still reference it.
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let result = User::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(format!(
                    "User {} is still referenced; deactivate instead",
                    id
                )),
                _ => AppError::Database(format!("Failed to delete user: {}", e)),
            })?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User {}", id)));
        }
        Ok(())
    }

    /// List users with optional filtering, newest first.
    pub async fn list_users(&self, filters: &UserFilters) -> AppResult<(Vec<user::Model>, u64)> {
        let mut select = User::find();

        if let Some(role) = filters.role {
            let role = self.find_role_by_name(role).await?;
            select = select.filter(user::Column::RoleId.eq(role.id));
        }

        if let Some(status) = filters.status {
            select = select.filter(user::Column::Status.eq(status.as_str()));
        }

        if let Some(ref term) = filters.search {
            select = select.filter(search_condition(term));
        }

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count users: {}", e)))?;

        let page = filters.pagination();
        let users = select
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        Ok((users, total))
    }

    /// Aggregate counts for the admin dashboard.
    pub async fn user_stats(&self) -> AppResult<UserStats> {
        let conn = self.connection();
        let count_err = |e: sea_orm::DbErr| AppError::Database(format!("Failed to count users: {}", e));

        let total = User::find().count(conn).await.map_err(count_err)?;

        let active = User::find()
            .filter(user::Column::Status.eq(UserStatus::Active.as_str()))
            .count(conn)
            .await
            .map_err(count_err)?;

        let admin_role = self.find_role_by_name(RoleName::Admin).await?;
        let admins = User::find()
            .filter(user::Column::RoleId.eq(admin_role.id))
            .count(conn)
            .await
            .map_err(count_err)?;

        let recent = User::find()
            .filter(user::Column::CreatedAt.gte(Utc::now() - Duration::days(30)))
            .count(conn)
            .await
            .map_err(count_err)?;

        Ok(UserStats {
            total,
            active,
            admins,
            recent,
        })
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;
        Ok(())
    }
}
