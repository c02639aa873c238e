//! Ticket domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Category, Department, Priority, Status};

/// A single help-desk request.
///
/// `assignee_id` is `Some` exactly when `status` has left `NotActive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    pub description: String,
    pub attachment: Option<String>,
    pub category: Category,
    pub department: Department,
    pub priority: Priority,
    pub status: Status,
    pub requester_id: Uuid,
    pub assignee_id: Option<Uuid>,
    /// Resolution comment recorded on completion.
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicket {
    pub requester_id: Uuid,
    pub subject: String,
    pub description: String,
    pub attachment: Option<String>,
    pub category: Category,
    pub department: Department,
    pub priority: Priority,
}

/// Insert payload handed to the store. Status always starts as `NotActive`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub requester_id: Uuid,
    pub subject: String,
    pub description: String,
    pub attachment: Option<String>,
    pub category: Category,
    pub department: Department,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl NewTicket {
    pub fn from_request(input: CreateTicket, created_at: DateTime<Utc>) -> Self {
        Self {
            requester_id: input.requester_id,
            subject: input.subject,
            description: input.description,
            attachment: input.attachment,
            category: input.category,
            department: input.department,
            priority: input.priority,
            created_at,
        }
    }
}

/// Denormalized person details attached to a ticket projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Ticket row as returned by searches: foreign keys are replaced by the
/// requester and assignee contact details (`None` when the relation is
/// absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub ticket_id: i64,
    pub subject: String,
    pub description: String,
    pub attachment: Option<String>,
    pub category: Category,
    pub department: Department,
    pub priority: Priority,
    pub status: Status,
    pub comment: Option<String>,
    pub requester: Option<Contact>,
    pub assignee: Option<Contact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal `(created_at, status)` pair used for time bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketStamp {
    pub created_at: DateTime<Utc>,
    pub status: Status,
}
