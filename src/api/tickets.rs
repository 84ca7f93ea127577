//! Ticket endpoints and the approval workflow.

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::JwtAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::ticket::{can_review, check_transition, status_of};
use crate::models::{CreateTicketRequest, ReviewDecision, ReviewTicketRequest, TicketResponse};

/// Configure ticket routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_task_tickets)
        .service(create_ticket)
        .service(get_ticket)
        .service(approve_ticket)
        .service(reject_ticket);
}

/// Tickets raised on one task.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketResponse>,
}

/// List tickets on a task.
///
/// GET /api/v1/tasks/{id}/tickets
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}/tickets",
    tag = "Tickets",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Tickets on the task", body = TicketListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/tasks/{id}/tickets")]
pub async fn list_task_tickets(
    _auth: JwtAuth,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let task_id = path.into_inner();
    pool.get_task(task_id).await?;

    let rows = pool.list_tickets_for_task(task_id).await?;
    let ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
    let mut assignees = pool.ticket_assignee_ids_for(&ids).await?;

    let tickets = rows
        .into_iter()
        .map(|t| {
            let ids = assignees.remove(&t.id).unwrap_or_default();
            TicketResponse::new(t, ids)
        })
        .collect();

    Ok(HttpResponse::Ok().json(TicketListResponse { tickets }))
}

/// Raise a ticket on a task.
///
/// POST /api/v1/tasks/{id}/tickets
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/tickets",
    tag = "Tickets",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Invalid input or unknown assignee"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[post("/tasks/{id}/tickets")]
pub async fn create_ticket(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: web::Json<CreateTicketRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let task_id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;

    let (ticket, assignee_ids) = pool.create_ticket(task_id, auth.user_id(), &req).await?;
    info!(ticket_id = ticket.id, task_id, requested_by = auth.user_id(), "Ticket raised");

    Ok(HttpResponse::Created().json(TicketResponse::new(ticket, assignee_ids)))
}

/// Get a ticket.
///
/// GET /api/v1/tickets/{id}
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    params(
        ("id" = i32, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket details", body = TicketResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Ticket not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    _auth: JwtAuth,
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let ticket = pool.get_ticket(id).await?;
    let mut assignees = pool.ticket_assignee_ids_for(&[id]).await?;

    Ok(HttpResponse::Ok().json(TicketResponse::new(
        ticket,
        assignees.remove(&id).unwrap_or_default(),
    )))
}

async fn review(
    auth: &JwtAuth,
    pool: &DbPool,
    id: i32,
    decision: ReviewDecision,
    notes: Option<String>,
) -> AppResult<TicketResponse> {
    let ticket = pool.get_ticket(id).await?;
    let task = pool.get_task(ticket.task_id).await?;

    if !can_review(auth.user_id(), auth.is_admin(), task.creator_id) {
        return Err(AppError::Forbidden(
            "Only an admin or the task's creator may review this ticket".to_string(),
        ));
    }
    check_transition(status_of(&ticket), decision)?;

    let reviewed = pool
        .review_ticket(id, auth.user_id(), decision, notes)
        .await?;
    info!(
        ticket_id = id,
        reviewer = auth.user_id(),
        status = %decision.status(),
        "Ticket reviewed"
    );

    let mut assignees = pool.ticket_assignee_ids_for(&[id]).await?;
    Ok(TicketResponse::new(
        reviewed,
        assignees.remove(&id).unwrap_or_default(),
    ))
}

/// Approve a ticket.
///
/// POST /api/v1/tickets/{id}/approve
/// Authorization: admin or the task's creator
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/approve",
    tag = "Tickets",
    params(
        ("id" = i32, Path, description = "Ticket ID")
    ),
    request_body(content = ReviewTicketRequest, description = "Optional reviewer note"),
    responses(
        (status = 200, description = "Ticket approved", body = TicketResponse),
        (status = 403, description = "Not allowed to review"),
        (status = 404, description = "Ticket not found"),
        (status = 409, description = "Ticket already decided")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[post("/tickets/{id}/approve")]
pub async fn approve_ticket(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: Option<web::Json<ReviewTicketRequest>>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let notes = body.and_then(|b| b.into_inner().notes);
    let ticket = review(&auth, &pool, path.into_inner(), ReviewDecision::Approve, notes).await?;
    Ok(HttpResponse::Ok().json(ticket))
}

/// Reject a ticket.
///
/// POST /api/v1/tickets/{id}/reject
/// Authorization: admin or the task's creator
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/reject",
    tag = "Tickets",
    params(
        ("id" = i32, Path, description = "Ticket ID")
    ),
    request_body(content = ReviewTicketRequest, description = "Optional reviewer note"),
    responses(
        (status = 200, description = "Ticket rejected", body = TicketResponse),
        (status = 403, description = "Not allowed to review"),
        (status = 404, description = "Ticket not found"),
        (status = 409, description = "Ticket already decided")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
#[post("/tickets/{id}/reject")]
pub async fn reject_ticket(
    auth: JwtAuth,
    path: web::Path<i32>,
    body: Option<web::Json<ReviewTicketRequest>>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let notes = body.and_then(|b| b.into_inner().notes);
    let ticket = review(&auth, &pool, path.into_inner(), ReviewDecision::Reject, notes).await?;
    Ok(HttpResponse::Ok().json(ticket))
}
