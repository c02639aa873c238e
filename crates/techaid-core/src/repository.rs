//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations own their store
//! handle; nothing here holds ambient session state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TechAidResult;
use crate::models::{
    actor::TicketScope,
    employee::{CreateEmployee, Employee, UpdateEmployee},
    enums::{Category, Department, Priority, Status},
    stats::StatusCounts,
    ticket::{NewTicket, Ticket, TicketStamp, TicketView},
};
use crate::window::DateWindow;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Optional exact-match narrowing. Absent fields impose no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketCriteria {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub department: Option<Department>,
}

/// Complete ticket predicate: who may see it, when it was created, and the
/// optional field filters, all ANDed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketFilter {
    pub scope: TicketScope,
    pub window: DateWindow,
    pub criteria: TicketCriteria,
}

impl TicketFilter {
    pub fn everything() -> Self {
        Self {
            scope: TicketScope::All,
            window: DateWindow::UNBOUNDED,
            criteria: TicketCriteria::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

pub trait TicketRepository: Send + Sync {
    /// Insert with the next sequential id and status `NotActive`.
    fn create(&self, input: NewTicket) -> impl Future<Output = TechAidResult<Ticket>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = TechAidResult<Ticket>> + Send;
    fn get_view(&self, id: i64) -> impl Future<Output = TechAidResult<TicketView>> + Send;
    /// Matching tickets, newest first, with contact projections.
    fn search(
        &self,
        filter: &TicketFilter,
    ) -> impl Future<Output = TechAidResult<Vec<TicketView>>> + Send;
    fn count(
        &self,
        filter: &TicketFilter,
    ) -> impl Future<Output = TechAidResult<StatusCounts>> + Send;
    /// `(created_at, status)` of matching tickets, oldest first.
    fn list_stamps(
        &self,
        filter: &TicketFilter,
    ) -> impl Future<Output = TechAidResult<Vec<TicketStamp>>> + Send;
    /// Atomically set the assignee and move to `Active`, but only while the
    /// current status is one of `allowed`. `None` when the guard did not
    /// match (or the ticket is missing). `at` becomes `updated_at`.
    fn assign_if(
        &self,
        id: i64,
        assignee_id: Uuid,
        allowed: &[Status],
        at: DateTime<Utc>,
    ) -> impl Future<Output = TechAidResult<Option<Ticket>>> + Send;
    /// Atomically complete an `Active` ticket assigned to `actor_id`.
    fn complete_if(
        &self,
        id: i64,
        actor_id: Uuid,
        comment: String,
        at: DateTime<Utc>,
    ) -> impl Future<Output = TechAidResult<Option<Ticket>>> + Send;
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

pub trait EmployeeRepository: Send + Sync {
    fn create(&self, input: CreateEmployee)
    -> impl Future<Output = TechAidResult<Employee>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TechAidResult<Employee>> + Send;
    /// Case-insensitive lookup.
    fn get_by_email(&self, email: &str) -> impl Future<Output = TechAidResult<Employee>> + Send;
    fn get_by_refresh_token_hash(
        &self,
        hash: &str,
    ) -> impl Future<Output = TechAidResult<Employee>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateEmployee,
    ) -> impl Future<Output = TechAidResult<Employee>> + Send;
    /// Deletes the employee and every ticket they requested.
    fn delete(&self, id: Uuid) -> impl Future<Output = TechAidResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = TechAidResult<PaginatedResult<Employee>>> + Send;
}
