//! API endpoint modules.

pub mod health;
pub mod log_work;
pub mod openapi;
pub mod tasks;
pub mod tickets;

pub use health::configure_health_routes;
pub use log_work::configure_routes as configure_log_work_routes;
pub use openapi::ApiDoc;
pub use tasks::configure_routes as configure_task_routes;
pub use tickets::configure_routes as configure_ticket_routes;
