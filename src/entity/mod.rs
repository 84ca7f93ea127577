//! SeaORM entity definitions for PostgreSQL database.

pub mod log_work;
pub mod role;
pub mod task;
pub mod task_assignee;
pub mod ticket;
pub mod ticket_assignee;
pub mod user;
