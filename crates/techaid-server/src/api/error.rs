use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use techaid_core::error::TechAidError;
use tracing::error;

/// HTTP face of [`TechAidError`].
#[derive(Debug)]
pub struct ApiError(pub TechAidError);

impl From<TechAidError> for ApiError {
    fn from(err: TechAidError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            TechAidError::InvalidFilter(_) | TechAidError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            TechAidError::NotFound { .. } => StatusCode::NOT_FOUND,
            TechAidError::Ownership { .. } | TechAidError::AuthorizationDenied { .. } => {
                StatusCode::FORBIDDEN
            }
            TechAidError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            TechAidError::AlreadyExists { .. } | TechAidError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            TechAidError::Database(_) | TechAidError::Crypto(_) | TechAidError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (TechAidError::InvalidFilter("x".into()), StatusCode::BAD_REQUEST),
            (TechAidError::validation("x"), StatusCode::BAD_REQUEST),
            (TechAidError::not_found("ticket", 1), StatusCode::NOT_FOUND),
            (
                TechAidError::Ownership {
                    ticket_id: 1,
                    actor_id: "a".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                TechAidError::AuthenticationFailed { reason: "x".into() },
                StatusCode::UNAUTHORIZED,
            ),
            (
                TechAidError::InvalidTransition {
                    ticket_id: 1,
                    action: "assigned",
                    status: "COMPLETED".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                TechAidError::Database("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code(), status);
        }
    }
}
