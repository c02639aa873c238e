//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use techaid_core::error::TechAidError;
use techaid_core::models::actor::Actor;
use techaid_core::models::enums::Role;

use super::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Rejects the request with 401 when the
/// `Authorization: Bearer` header is missing or invalid.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl CurrentActor {
    /// 403 unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
        self.0.require_role(roles).map_err(ApiError)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError(TechAidError::AuthenticationFailed {
                reason: "missing bearer token".into(),
            })
        })?;
        let actor = state.auth.authenticate(token)?;
        Ok(CurrentActor(actor))
    }
}
