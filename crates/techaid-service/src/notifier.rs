//! Email delivery and the notification templates sent on ticket
//! transitions.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Deserialize;
use techaid_core::error::{TechAidError, TechAidResult};
use techaid_core::models::employee::Employee;
use techaid_core::models::ticket::Ticket;
use techaid_core::notify::{EmailMessage, NotificationError, Notifier};
use tracing::info;

/// SMTP relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address, e.g. `support@optimusbank.com`.
    pub sender: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

fn default_port() -> u16 {
    587
}

fn default_sender_name() -> String {
    "Support".into()
}

/// Sends HTML mail through an SMTP relay. The blocking transport runs on
/// Tokio's blocking pool.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> TechAidResult<Self> {
        let from = Mailbox::new(
            Some(config.sender_name.clone()),
            config
                .sender
                .parse()
                .map_err(|e| TechAidError::validation(format!("invalid sender address: {e}")))?,
        );

        let transport = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => SmtpTransport::relay(&config.host)
                .map_err(|e| TechAidError::Internal(format!("SMTP relay error: {e}")))?
                .port(config.port)
                .credentials(Credentials::new(user.clone(), pass.clone()))
                .build(),
            _ => SmtpTransport::builder_dangerous(&config.host)
                .port(config.port)
                .build(),
        };

        Ok(Self { transport, from })
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| NotificationError(format!("invalid recipient {}: {e}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body)
            .map_err(|e| NotificationError(format!("failed to build email: {e}")))?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| NotificationError(format!("mail worker failed: {e}")))?
            .map_err(|e| NotificationError(format!("failed to send email: {e}")))?;

        Ok(())
    }
}

/// Writes emails to the log instead of sending them. Used when no SMTP
/// relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery disabled; message logged"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub(crate) fn assigned_to_requester(
    ticket: &Ticket,
    requester: &Employee,
    personnel: &Employee,
) -> EmailMessage {
    EmailMessage {
        to: requester.email.clone(),
        subject: "Your Ticket Has Been Assigned".into(),
        html_body: format!(
            "<p>Hi {requester},</p>\
             <p>Your ticket with <strong>ID: {id}</strong> has been assigned to \
             <strong>{personnel}</strong>.</p>\
             <p>You will receive a notification as soon as it is completed.</p>\
             <p>Thank you for using TechAid.</p>",
            requester = requester.full_name(),
            id = ticket.id,
            personnel = personnel.full_name(),
        ),
    }
}

pub(crate) fn assigned_to_personnel(ticket: &Ticket, personnel: &Employee) -> EmailMessage {
    EmailMessage {
        to: personnel.email.clone(),
        subject: "New Ticket Assigned".into(),
        html_body: format!(
            "<p>Hi {personnel},</p>\
             <p>A new ticket with <strong>ID: {id}</strong> has been assigned to you.</p>\
             <p>Description: {description}.</p>\
             <p>Priority: {priority}.</p>\
             <p>Kindly attend to it as soon as you can.</p>\
             <p>Thank you for using Optimus TechAid.</p>",
            personnel = personnel.full_name(),
            id = ticket.id,
            description = ticket.description,
            priority = ticket.priority,
        ),
    }
}

pub(crate) fn completed_to_requester(ticket: &Ticket, requester: &Employee) -> EmailMessage {
    EmailMessage {
        to: requester.email.clone(),
        subject: "Ticket Marked as Completed".into(),
        html_body: format!(
            "<p>Hi {requester},</p>\
             <p>Your ticket with <strong>ID: {id}</strong> has been marked as \
             <strong>Completed</strong>.</p>\
             <p><strong>Resolution Comment:</strong> {comment}</p>\
             <p>Thank you for using Optimus TechAid.</p>",
            requester = requester.full_name(),
            id = ticket.id,
            comment = ticket.comment.as_deref().unwrap_or_default(),
        ),
    }
}
