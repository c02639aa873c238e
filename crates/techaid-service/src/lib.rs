//! TechAid services: ticket lifecycle, search and analytics, employee
//! management, and outbound email.

pub mod analytics;
pub mod employees;
pub mod notifier;
pub mod tickets;

pub use analytics::{AnalyticsReport, DailyCount, WeeklyCount};
pub use employees::{EmployeeService, ProfileUpdate};
pub use notifier::{LogNotifier, SmtpConfig, SmtpNotifier};
pub use tickets::{AssignmentPolicy, Delivery, TicketQuery, TicketService, TransitionOutcome};
