//! Ticket lifecycle, search, count and analytics service.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use techaid_core::clock::Clock;
use techaid_core::error::{TechAidError, TechAidResult};
use techaid_core::models::actor::{Actor, TicketScope};
use techaid_core::models::employee::Employee;
use techaid_core::models::enums::{Role, Status};
use techaid_core::models::stats::StatusCounts;
use techaid_core::models::ticket::{CreateTicket, NewTicket, Ticket, TicketView};
use techaid_core::notify::{EmailMessage, NotificationError, Notifier};
use techaid_core::repository::{EmployeeRepository, TicketCriteria, TicketFilter, TicketRepository};
use techaid_core::window::{AnalyticsPlan, AnalyticsToken, FilterToken, resolve_window};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analytics::{AnalyticsReport, build_report};
use crate::notifier;

/// Which states a ticket may be assigned from.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct AssignmentPolicy {
    /// Allow moving an `ACTIVE` ticket to a different assignee.
    pub allow_reassign_active: bool,
}

impl AssignmentPolicy {
    fn assignable_from(&self) -> &'static [Status] {
        if self.allow_reassign_active {
            &[Status::NotActive, Status::Active]
        } else {
            &[Status::NotActive]
        }
    }
}

/// Search, count and analytics parameters as they arrive from a caller.
#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
    /// Filter token (`day`, `week`, `month`, `set`, `none`; analytics also
    /// takes `week1`..`week4`). Empty means `none`.
    pub filter: String,
    /// Required by `set`, ignored otherwise.
    pub date: Option<NaiveDate>,
    pub criteria: TicketCriteria,
}

impl TicketQuery {
    fn token(&self) -> &str {
        if self.filter.trim().is_empty() {
            "none"
        } else {
            &self.filter
        }
    }
}

/// Whether the emails following a committed transition went out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    Failed(String),
}

/// Result of a committed assign or complete. The transition stands even
/// when `notification` is `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub ticket: Ticket,
    pub notification: Delivery,
    pub message: String,
}

pub struct TicketService<T, E, N>
where
    T: TicketRepository,
    E: EmployeeRepository,
    N: Notifier,
{
    tickets: T,
    employees: E,
    notifier: N,
    clock: Arc<dyn Clock>,
    policy: AssignmentPolicy,
}

impl<T, E, N> TicketService<T, E, N>
where
    T: TicketRepository,
    E: EmployeeRepository,
    N: Notifier,
{
    pub fn new(
        tickets: T,
        employees: E,
        notifier: N,
        clock: Arc<dyn Clock>,
        policy: AssignmentPolicy,
    ) -> Self {
        Self {
            tickets,
            employees,
            notifier,
            clock,
            policy,
        }
    }

    /// Open a ticket on behalf of an existing employee.
    pub async fn create(&self, input: CreateTicket) -> TechAidResult<Ticket> {
        if input.subject.trim().is_empty() {
            return Err(TechAidError::validation("subject must not be empty"));
        }
        if input.description.trim().is_empty() {
            return Err(TechAidError::validation("description must not be empty"));
        }
        self.employees.get_by_id(input.requester_id).await?;

        let ticket = self
            .tickets
            .create(NewTicket::from_request(input, self.clock.now()))
            .await?;
        info!(
            ticket_id = ticket.id,
            requester_id = %ticket.requester_id,
            priority = %ticket.priority,
            "Ticket created"
        );
        Ok(ticket)
    }

    /// A single ticket, if the actor may see it.
    pub async fn get(&self, actor: &Actor, id: i64) -> TechAidResult<TicketView> {
        let ticket = self.tickets.get_by_id(id).await?;
        if !TicketScope::for_actor(actor).admits(ticket.requester_id, ticket.assignee_id) {
            return Err(TechAidError::not_found("ticket", id));
        }
        self.tickets.get_view(id).await
    }

    pub async fn search(
        &self,
        scope: TicketScope,
        query: &TicketQuery,
    ) -> TechAidResult<Vec<TicketView>> {
        let filter = self.filter(scope, query)?;
        self.tickets.search(&filter).await
    }

    /// Unassigned tickets across every requester, the pool IT personnel
    /// assign themselves from. Any status criterion in `query` is replaced.
    pub async fn queue(&self, query: &TicketQuery) -> TechAidResult<Vec<TicketView>> {
        let mut query = query.clone();
        query.criteria.status = Some(Status::NotActive);
        self.search(TicketScope::All, &query).await
    }

    pub async fn count(&self, scope: TicketScope, query: &TicketQuery) -> TechAidResult<StatusCounts> {
        let filter = self.filter(scope, query)?;
        self.tickets.count(&filter).await
    }

    /// Time-bucketed counts. `month` breaks down into the four month weeks,
    /// `week`/`day`/`set` into calendar days.
    pub async fn analytics(
        &self,
        scope: TicketScope,
        query: &TicketQuery,
    ) -> TechAidResult<AnalyticsReport> {
        let token: AnalyticsToken = query.token().parse()?;
        let plan = AnalyticsPlan::resolve(token, query.date, self.clock.today())?;
        let stamps = self
            .tickets
            .list_stamps(&TicketFilter {
                scope,
                window: plan.span(),
                criteria: query.criteria,
            })
            .await?;
        Ok(build_report(&plan, &stamps))
    }

    /// Assign a ticket to an IT personnel employee and move it to `ACTIVE`.
    pub async fn assign(&self, ticket_id: i64, personnel_id: Uuid) -> TechAidResult<TransitionOutcome> {
        let personnel = self.employees.get_by_id(personnel_id).await?;
        if personnel.role != Role::ItPersonnel {
            return Err(TechAidError::validation(format!(
                "employee {personnel_id} is not IT personnel"
            )));
        }

        let allowed = self.policy.assignable_from();
        let Some(ticket) = self
            .tickets
            .assign_if(ticket_id, personnel_id, allowed, self.clock.now())
            .await?
        else {
            let current = self.tickets.get_by_id(ticket_id).await?;
            return Err(TechAidError::InvalidTransition {
                ticket_id,
                action: "assigned",
                status: current.status.to_string(),
            });
        };
        info!(ticket_id, assignee_id = %personnel_id, "Ticket assigned");

        let notification = match self.notify_assignment(&ticket, &personnel).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!(ticket_id, error = %e, "Assignment emails failed");
                Delivery::Failed(e.0)
            }
        };
        let message = match &notification {
            Delivery::Sent => "Ticket assigned successfully and emails sent.".to_string(),
            Delivery::Failed(e) => format!("Ticket assigned, but email sending failed: {e}"),
        };

        Ok(TransitionOutcome {
            ticket,
            notification,
            message,
        })
    }

    /// Complete an `ACTIVE` ticket assigned to `actor_id`, recording the
    /// resolution comment.
    pub async fn complete(
        &self,
        actor_id: Uuid,
        ticket_id: i64,
        comment: String,
    ) -> TechAidResult<TransitionOutcome> {
        let comment = comment.trim().to_string();
        if comment.is_empty() {
            return Err(TechAidError::validation("a resolution comment is required"));
        }
        let Some(ticket) = self
            .tickets
            .complete_if(ticket_id, actor_id, comment, self.clock.now())
            .await?
        else {
            let current = self.tickets.get_by_id(ticket_id).await?;
            if current.assignee_id != Some(actor_id) {
                return Err(TechAidError::Ownership {
                    ticket_id,
                    actor_id: actor_id.to_string(),
                });
            }
            return Err(TechAidError::InvalidTransition {
                ticket_id,
                action: "completed",
                status: current.status.to_string(),
            });
        };
        info!(ticket_id, assignee_id = %actor_id, "Ticket completed");

        let notification = match self.notify_completion(&ticket).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!(ticket_id, error = %e, "Completion email failed");
                Delivery::Failed(e.0)
            }
        };
        let message = match &notification {
            Delivery::Sent => "Ticket marked as completed and email sent successfully.".to_string(),
            Delivery::Failed(e) => format!("Ticket marked as completed, but email failed: {e}"),
        };

        Ok(TransitionOutcome {
            ticket,
            notification,
            message,
        })
    }

    fn filter(&self, scope: TicketScope, query: &TicketQuery) -> TechAidResult<TicketFilter> {
        let token: FilterToken = query.token().parse()?;
        Ok(TicketFilter {
            scope,
            window: resolve_window(token, query.date, self.clock.today())?,
            criteria: query.criteria,
        })
    }

    async fn requester_of(&self, ticket: &Ticket) -> Result<Employee, NotificationError> {
        self.employees
            .get_by_id(ticket.requester_id)
            .await
            .map_err(|e| NotificationError(format!("requester lookup failed: {e}")))
    }

    async fn notify_assignment(
        &self,
        ticket: &Ticket,
        personnel: &Employee,
    ) -> Result<(), NotificationError> {
        let requester = self.requester_of(ticket).await?;
        self.deliver(notifier::assigned_to_requester(ticket, &requester, personnel))
            .await?;
        self.deliver(notifier::assigned_to_personnel(ticket, personnel))
            .await
    }

    async fn notify_completion(&self, ticket: &Ticket) -> Result<(), NotificationError> {
        let requester = self.requester_of(ticket).await?;
        self.deliver(notifier::completed_to_requester(ticket, &requester))
            .await
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.notifier.send(message).await
    }
}
