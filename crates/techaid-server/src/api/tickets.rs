use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use techaid_core::error::TechAidError;
use techaid_core::models::actor::TicketScope;
use techaid_core::models::enums::{Category, Department, Priority, Role, Status};
use techaid_core::models::stats::StatusCounts;
use techaid_core::models::ticket::{CreateTicket, Ticket, TicketView};
use techaid_core::repository::TicketCriteria;
use techaid_service::{AnalyticsReport, TicketQuery, TransitionOutcome};
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::extract::CurrentActor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub attachment: Option<String>,
    pub category: Category,
    pub department: Department,
    pub priority: Priority,
}

/// `?filter=week&date=2025-03-05&status=ACTIVE&priority=HIGH...`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub filter: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub department: Option<Department>,
}

impl From<QueryParams> for TicketQuery {
    fn from(params: QueryParams) -> Self {
        TicketQuery {
            filter: params.filter.unwrap_or_default(),
            date: params.date,
            criteria: TicketCriteria {
                status: params.status,
                priority: params.priority,
                category: params.category,
                department: params.department,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignRequest {
    /// Required when an admin assigns; IT personnel always assign themselves.
    pub personnel_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub comment: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tickets", post(create))
        .route("/api/tickets/search", get(search_own))
        .route("/api/tickets/count", get(count_own))
        .route("/api/tickets/queue", get(queue))
        .route("/api/tickets/totals", get(totals))
        .route("/api/tickets/{id}", get(fetch))
        .route("/api/tickets/{id}/assign", post(assign))
        .route("/api/tickets/{id}/complete", post(complete))
        .route("/api/admin/tickets/search", get(search_all))
        .route("/api/admin/tickets/count", get(count_all))
        .route("/api/admin/tickets/analytics", get(analytics))
}

async fn create(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(body): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = state
        .tickets
        .create(CreateTicket {
            requester_id: actor.0.id,
            subject: body.subject,
            description: body.description,
            attachment: body.attachment,
            category: body.category,
            department: body.department,
            priority: body.priority,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn fetch(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<TicketView>> {
    Ok(Json(state.tickets.get(&actor.0, id).await?))
}

async fn search_own(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Vec<TicketView>>> {
    let scope = TicketScope::Involving(actor.0.id);
    Ok(Json(state.tickets.search(scope, &params.into()).await?))
}

async fn count_own(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<StatusCounts>> {
    let scope = TicketScope::Involving(actor.0.id);
    Ok(Json(state.tickets.count(scope, &params.into()).await?))
}

/// Unassigned tickets for IT personnel to pick from.
async fn queue(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Vec<TicketView>>> {
    actor.require(&[Role::ItPersonnel, Role::Admin])?;
    Ok(Json(state.tickets.queue(&params.into()).await?))
}

/// Help-desk wide status tiles (total, active, not active, completed).
async fn totals(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<StatusCounts>> {
    actor.require(&[Role::ItPersonnel, Role::Admin])?;
    Ok(Json(
        state.tickets.count(TicketScope::All, &params.into()).await?,
    ))
}

async fn search_all(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Vec<TicketView>>> {
    actor.require(&[Role::Admin])?;
    Ok(Json(
        state.tickets.search(TicketScope::All, &params.into()).await?,
    ))
}

async fn count_all(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<StatusCounts>> {
    actor.require(&[Role::Admin])?;
    Ok(Json(
        state.tickets.count(TicketScope::All, &params.into()).await?,
    ))
}

async fn analytics(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<AnalyticsReport>> {
    actor.require(&[Role::Admin])?;
    Ok(Json(
        state
            .tickets
            .analytics(TicketScope::All, &params.into())
            .await?,
    ))
}

async fn assign(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<AssignRequest>,
) -> ApiResult<Json<TransitionOutcome>> {
    let personnel_id = match actor.0.role {
        Role::ItPersonnel => actor.0.id,
        Role::Admin => body.personnel_id.ok_or_else(|| {
            ApiError(TechAidError::validation(
                "personnel_id is required when an admin assigns a ticket",
            ))
        })?,
        Role::BankStaff => {
            return Err(ApiError(TechAidError::AuthorizationDenied {
                reason: "only IT personnel or admins may assign tickets".into(),
            }));
        }
    };
    Ok(Json(state.tickets.assign(id, personnel_id).await?))
}

async fn complete(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<CompleteRequest>,
) -> ApiResult<Json<TransitionOutcome>> {
    actor.require(&[Role::ItPersonnel])?;
    Ok(Json(
        state
            .tickets
            .complete(actor.0.id, id, body.comment)
            .await?,
    ))
}
