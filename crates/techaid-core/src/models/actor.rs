//! Authenticated caller identity and the ticket visibility it implies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;
use crate::error::{TechAidError, TechAidResult};

/// The `(id, role)` pair taken from a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `AuthorizationDenied` unless the actor holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> TechAidResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(TechAidError::AuthorizationDenied {
                reason: format!("role {} may not perform this action", self.role),
            })
        }
    }
}

/// Which tickets a query may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    /// No actor restriction.
    All,
    /// Only tickets the employee requested or is assigned to.
    Involving(Uuid),
}

impl TicketScope {
    /// Admins and IT personnel see every ticket, everyone else only their own.
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin | Role::ItPersonnel => TicketScope::All,
            Role::BankStaff => TicketScope::Involving(actor.id),
        }
    }

    pub fn admits(&self, requester_id: Uuid, assignee_id: Option<Uuid>) -> bool {
        match self {
            TicketScope::All => true,
            TicketScope::Involving(id) => requester_id == *id || assignee_id == Some(*id),
        }
    }
}
