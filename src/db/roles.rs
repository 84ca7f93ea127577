//! Database queries for roles.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::role::{self, Entity as Role};
use crate::error::{AppError, AppResult};
use crate::models::RoleName;

use super::DbPool;

impl DbPool {
    /// Find a role by name. Missing roles mean the schema is not migrated.
    pub async fn find_role_by_name(&self, name: RoleName) -> AppResult<role::Model> {
        Role::find()
            .filter(role::Column::Name.eq(name.as_str()))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get role: {}", e)))?
            .ok_or_else(|| AppError::Internal(format!("Role '{}' is not seeded", name)))
    }

    /// Role name for a role id.
    pub async fn role_name(&self, role_id: i32) -> AppResult<RoleName> {
        let role = Role::find_by_id(role_id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get role: {}", e)))?
            .ok_or_else(|| AppError::Internal(format!("Role {} does not exist", role_id)))?;

        RoleName::parse(&role.name)
            .ok_or_else(|| AppError::Internal(format!("Unknown role name '{}'", role.name)))
    }

    /// All roles keyed by id, for resolving names over a page of users.
    pub async fn role_names(&self) -> AppResult<HashMap<i32, RoleName>> {
        let roles = Role::find()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list roles: {}", e)))?;

        Ok(roles
            .into_iter()
            .filter_map(|r| RoleName::parse(&r.name).map(|name| (r.id, name)))
            .collect())
    }
}
