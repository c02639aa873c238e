use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use techaid_core::models::employee::Employee;
use techaid_core::models::enums::Role;
use techaid_core::repository::Pagination;
use techaid_service::ProfileUpdate;
use uuid::Uuid;

use super::error::ApiResult;
use super::extract::CurrentActor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EmployeePage {
    pub items: Vec<Employee>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/employees", get(list))
        .route("/api/employees/me", patch(update_me))
        .route("/api/employees/{id}", get(fetch).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<EmployeePage>> {
    actor.require(&[Role::Admin])?;
    let defaults = Pagination::default();
    let page = state
        .employees
        .list(Pagination {
            offset: params.offset.unwrap_or(defaults.offset),
            limit: params.limit.unwrap_or(defaults.limit).min(200),
        })
        .await?;
    Ok(Json(EmployeePage {
        items: page.items,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}

async fn fetch(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.employees.get(id).await?))
}

async fn update_me(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.employees.update_profile(actor.0.id, update).await?))
}

async fn remove(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.employees.delete(&actor.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
