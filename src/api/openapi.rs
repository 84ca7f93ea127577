//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tasktrack Server",
        version = "0.3.0",
        description = "Task, ticket and work-log management API with role-based access"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        services::auth::register,
        services::auth::login,
        services::auth::logout,
        services::auth::get_current_user,
        // User endpoints
        services::users::list_users,
        services::users::search_users,
        services::users::user_stats,
        services::users::get_user,
        services::users::create_user,
        services::users::update_user,
        services::users::delete_user,
        // Task endpoints
        api::tasks::list_tasks,
        api::tasks::search_tasks,
        api::tasks::create_task,
        api::tasks::get_task,
        api::tasks::update_task,
        api::tasks::delete_task,
        api::tasks::replace_assignees,
        // Ticket endpoints
        api::tickets::list_task_tickets,
        api::tickets::create_ticket,
        api::tickets::get_ticket,
        api::tickets::approve_ticket,
        api::tickets::reject_ticket,
        // Work log endpoints
        api::log_work::list_log_work,
        api::log_work::create_log_work,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::Pagination,
            services::auth::MessageResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::RegisterRequest,
            models::LoginRequest,
            models::LoginResponse,
            // Users
            models::RoleName,
            models::UserStatus,
            models::UserResponse,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::UserListResponse,
            models::UserStats,
            // Tasks
            models::TaskStatus,
            models::Priority,
            models::TaskResponse,
            models::CreateTaskRequest,
            models::UpdateTaskRequest,
            models::AssigneesRequest,
            models::TaskListResponse,
            // Tickets
            models::TicketStatus,
            models::TicketResponse,
            models::CreateTicketRequest,
            models::ReviewTicketRequest,
            api::tickets::TicketListResponse,
            // Work log
            models::CreateLogWorkRequest,
            models::LogWorkResponse,
            models::LogWorkListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and the current session"),
        (name = "Users", description = "User management"),
        (name = "Tasks", description = "Tasks and their assignees"),
        (name = "Tickets", description = "Change requests and their approval"),
        (name = "Work Log", description = "Time logged against tasks")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
