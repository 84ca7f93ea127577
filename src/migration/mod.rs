//! SeaORM database migrations.
//!
//! Units are applied by [`crate::db::migrations::MigrationRunner`] in the order
//! returned by [`Migrator::migrations`]. Every statement inside a unit must be
//! safe to run twice against the same database.

pub use sea_orm_migration::prelude::*;

pub mod guard;

mod m20250723_054540_create_task_table;
mod m20250726_061226_create_user_table;
pub mod m20250728_095000_create_roles;
pub mod m20250730_070000_add_user_task_extensions;
mod m20250730_172413_add_user_aggregates;

pub use m20250723_054540_create_task_table::Migration as CreateTaskTable;
pub use m20250726_061226_create_user_table::Migration as CreateUserTable;
pub use m20250728_095000_create_roles::Migration as CreateRoles;
pub use m20250730_070000_add_user_task_extensions::Migration as AddUserTaskExtensions;
pub use m20250730_172413_add_user_aggregates::Migration as AddUserAggregates;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(CreateTaskTable),
            Box::new(CreateUserTable),
            Box::new(CreateRoles),
            Box::new(AddUserTaskExtensions),
            Box::new(AddUserAggregates),
        ]
    }
}
