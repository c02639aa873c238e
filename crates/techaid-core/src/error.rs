//! Error types for the TechAid system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TechAidError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Ticket {ticket_id} is not assigned to employee {actor_id}")]
    Ownership { ticket_id: i64, actor_id: String },

    #[error("Ticket {ticket_id} cannot be {action} while {status}")]
    InvalidTransition {
        ticket_id: i64,
        action: &'static str,
        status: String,
    },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TechAidError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type TechAidResult<T> = Result<T, TechAidError>;
