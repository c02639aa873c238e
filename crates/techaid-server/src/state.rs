//! Shared application state handed to every handler.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use techaid_auth::AuthService;
use techaid_core::clock::{Clock, SystemClock};
use techaid_core::error::TechAidResult;
use techaid_core::notify::{EmailMessage, NotificationError, Notifier};
use techaid_db::repository::{SurrealEmployeeRepository, SurrealTicketRepository};
use techaid_service::{EmployeeService, LogNotifier, SmtpNotifier, TicketService};
use tracing::info;

use crate::config::AppConfig;

pub type Employees = SurrealEmployeeRepository<Any>;
pub type Tickets = SurrealTicketRepository<Any>;

/// The configured mail transport.
#[derive(Clone)]
pub enum AppNotifier {
    Log(LogNotifier),
    Smtp(SmtpNotifier),
}

impl Notifier for AppNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        match self {
            AppNotifier::Log(n) => n.send(message).await,
            AppNotifier::Smtp(n) => n.send(message).await,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<Employees>>,
    pub employees: Arc<EmployeeService<Employees>>,
    pub tickets: Arc<TicketService<Tickets, Employees, AppNotifier>>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, config: &AppConfig) -> TechAidResult<Self> {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        db: Surreal<Any>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> TechAidResult<Self> {
        let employees = match &config.auth.pepper {
            Some(pepper) => SurrealEmployeeRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealEmployeeRepository::new(db.clone()),
        };

        let notifier = match &config.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "SMTP notifications enabled");
                AppNotifier::Smtp(SmtpNotifier::new(smtp)?)
            }
            None => {
                info!("No SMTP relay configured; emails will be logged");
                AppNotifier::Log(LogNotifier)
            }
        };

        Ok(Self {
            auth: Arc::new(AuthService::new(employees.clone(), config.auth.clone())),
            employees: Arc::new(EmployeeService::new(
                employees.clone(),
                config.auth.min_password_length,
            )),
            tickets: Arc::new(TicketService::new(
                SurrealTicketRepository::new(db),
                employees,
                notifier,
                clock,
                config.tickets,
            )),
        })
    }
}
