//! Tasktrack server library.
//!
//! Task, ticket and work-log management over PostgreSQL: schema migrations,
//! data access, authentication and the HTTP API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;

use actix_web::web;

/// Register every `/api/v1` route group on a scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(api::configure_health_routes)
        .configure(services::configure_auth_routes)
        .configure(services::configure_user_routes)
        .configure(api::configure_task_routes)
        .configure(api::configure_ticket_routes)
        .configure(api::configure_log_work_routes);
}
