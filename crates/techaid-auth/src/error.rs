//! Authentication error types.

use techaid_core::error::TechAidError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email must belong to the {0} domain")]
    EmailDomainNotAllowed(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("refresh token is invalid or expired")]
    RefreshTokenRejected,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for TechAidError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailDomainNotAllowed(_) => TechAidError::validation(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::RefreshTokenRejected => TechAidError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => TechAidError::Crypto(msg),
        }
    }
}
