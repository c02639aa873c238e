//! Employee domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Department, Role};
use super::ticket::Contact;
use crate::error::{TechAidError, TechAidResult};

/// Reject passwords shorter than `min_length` characters. Applied on
/// registration and on self-service password changes.
pub fn check_password_length(password: &str, min_length: usize) -> TechAidResult<()> {
    if password.chars().count() < min_length {
        return Err(TechAidError::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    /// Always stored lowercase.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub department: Option<Department>,
    /// SHA-256 hex digest of the current refresh token.
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn contact(&self) -> Contact {
        Contact {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    /// Raw password; re-hashed by the store.
    pub password: Option<String>,
    pub department: Option<Department>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub refresh_token_hash: Option<Option<String>>,
    pub refresh_token_expires_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_counts_characters() {
        assert!(check_password_length("12345678", 8).is_ok());
        assert!(check_password_length("пароль12", 8).is_ok());
        let err = check_password_length("1234567", 8).unwrap_err();
        assert!(matches!(err, TechAidError::Validation { .. }));
        assert!(err.to_string().contains("at least 8 characters"));
    }
}
