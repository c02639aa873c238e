use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use techaid_auth::{LoginInput, RegisterInput, TokenPair};
use techaid_core::models::employee::Employee;
use techaid_core::models::enums::{Department, Role};

use super::error::ApiResult;
use super::extract::CurrentActor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    pub role: Role,
    pub department: Option<Department>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let employee = state
        .auth
        .register(RegisterInput {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            phone_number: body.phone_number,
            role: body.role,
            department: body.department,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let pair = state
        .auth
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(pair))
}

async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    Ok(Json(state.auth.refresh(&body.refresh_token).await?))
}

async fn logout(State(state): State<AppState>, actor: CurrentActor) -> ApiResult<StatusCode> {
    state.auth.logout(actor.0.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
