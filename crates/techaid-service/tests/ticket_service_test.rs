//! Integration tests for the ticket service against in-memory SurrealDB.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use techaid_core::clock::FixedClock;
use techaid_core::error::TechAidError;
use techaid_core::models::actor::{Actor, TicketScope};
use techaid_core::models::employee::{CreateEmployee, Employee};
use techaid_core::models::enums::{Category, Department, Priority, Role, Status};
use techaid_core::models::ticket::CreateTicket;
use techaid_core::notify::{EmailMessage, NotificationError, Notifier};
use techaid_core::repository::{EmployeeRepository, TicketCriteria};
use techaid_db::repository::{SurrealEmployeeRepository, SurrealTicketRepository};
use techaid_service::{AnalyticsReport, AssignmentPolicy, Delivery, TicketQuery, TicketService};
use uuid::Uuid;

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send(&self, _message: EmailMessage) -> Result<(), NotificationError> {
        Err(NotificationError("connection refused".into()))
    }
}

type Service<N> = TicketService<SurrealTicketRepository<Db>, SurrealEmployeeRepository<Db>, N>;

struct Fixture<N: Notifier> {
    service: Service<N>,
    requester: Employee,
    personnel: Employee,
    other_personnel: Employee,
    admin: Employee,
}

async fn setup_with<N: Notifier>(notifier: N, policy: AssignmentPolicy) -> Fixture<N> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    techaid_db::run_migrations(&db).await.unwrap();

    let employees = SurrealEmployeeRepository::new(db.clone());
    let requester = employees
        .create(employee("e1@optimusbank.com", "Amaka", Role::BankStaff))
        .await
        .unwrap();
    let personnel = employees
        .create(employee("p1@optimusbank.com", "Tunde", Role::ItPersonnel))
        .await
        .unwrap();
    let other_personnel = employees
        .create(employee("p2@optimusbank.com", "Kemi", Role::ItPersonnel))
        .await
        .unwrap();
    let admin = employees
        .create(employee("admin@optimusbank.com", "Ifeoma", Role::Admin))
        .await
        .unwrap();

    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap());
    let service = TicketService::new(
        SurrealTicketRepository::new(db),
        employees,
        notifier,
        Arc::new(clock),
        policy,
    );

    Fixture {
        service,
        requester,
        personnel,
        other_personnel,
        admin,
    }
}

async fn setup() -> (Fixture<RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let fx = setup_with(notifier.clone(), AssignmentPolicy::default()).await;
    (fx, notifier)
}

fn employee(email: &str, first_name: &str, role: Role) -> CreateEmployee {
    CreateEmployee {
        email: email.into(),
        password: "Sup3rSecret!".into(),
        first_name: first_name.into(),
        last_name: "Test".into(),
        phone_number: "0800".into(),
        role,
        department: None,
    }
}

fn software_ticket(requester_id: Uuid) -> CreateTicket {
    CreateTicket {
        requester_id,
        subject: "Core banking app crashes".into(),
        description: "Crashes on login since this morning".into(),
        attachment: None,
        category: Category::Software,
        department: Department::Sales,
        priority: Priority::Low,
    }
}

fn query(filter: &str) -> TicketQuery {
    TicketQuery {
        filter: filter.into(),
        ..TicketQuery::default()
    }
}

#[tokio::test]
async fn full_lifecycle_and_ownership() {
    let (fx, notifier) = setup().await;

    let ticket = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    assert_eq!(ticket.status, Status::NotActive);
    assert!(ticket.assignee_id.is_none());
    assert_eq!(
        ticket.created_at,
        Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap()
    );

    let assigned = fx.service.assign(ticket.id, fx.personnel.id).await.unwrap();
    assert_eq!(assigned.ticket.status, Status::Active);
    assert_eq!(assigned.ticket.assignee_id, Some(fx.personnel.id));
    // Transition stamps come from the service clock, not the store's.
    assert_eq!(assigned.ticket.updated_at, ticket.created_at);
    assert_eq!(assigned.notification, Delivery::Sent);
    assert_eq!(
        assigned.message,
        "Ticket assigned successfully and emails sent."
    );

    let completed = fx
        .service
        .complete(fx.personnel.id, ticket.id, "fixed".into())
        .await
        .unwrap();
    assert_eq!(completed.ticket.status, Status::Completed);
    assert_eq!(completed.ticket.comment.as_deref(), Some("fixed"));
    assert_eq!(
        completed.ticket.updated_at,
        Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap()
    );

    let err = fx
        .service
        .complete(fx.other_personnel.id, ticket.id, "me too".into())
        .await
        .unwrap_err();
    assert!(matches!(err, TechAidError::Ownership { .. }));

    let admin = Actor::new(fx.admin.id, Role::Admin);
    let view = fx.service.get(&admin, ticket.id).await.unwrap();
    assert_eq!(view.status, Status::Completed);
    assert_eq!(view.comment.as_deref(), Some("fixed"));

    let sent = notifier.sent();
    let recipients: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
    assert_eq!(
        recipients,
        vec![
            "e1@optimusbank.com",
            "p1@optimusbank.com",
            "e1@optimusbank.com"
        ]
    );
    assert_eq!(sent[0].subject, "Your Ticket Has Been Assigned");
    assert!(sent[0].html_body.contains("Tunde Test"));
    assert_eq!(sent[1].subject, "New Ticket Assigned");
    assert_eq!(sent[2].subject, "Ticket Marked as Completed");
    assert!(sent[2].html_body.contains("fixed"));
}

#[tokio::test]
async fn completing_twice_is_an_invalid_transition() {
    let (fx, _) = setup().await;
    let ticket = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    fx.service.assign(ticket.id, fx.personnel.id).await.unwrap();
    fx.service
        .complete(fx.personnel.id, ticket.id, "done".into())
        .await
        .unwrap();

    let err = fx
        .service
        .complete(fx.personnel.id, ticket.id, "again".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TechAidError::InvalidTransition {
            action: "completed",
            ..
        }
    ));
}

#[tokio::test]
async fn completed_ticket_cannot_be_assigned() {
    let (fx, _) = setup().await;
    let ticket = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    fx.service.assign(ticket.id, fx.personnel.id).await.unwrap();
    fx.service
        .complete(fx.personnel.id, ticket.id, "done".into())
        .await
        .unwrap();

    let err = fx
        .service
        .assign(ticket.id, fx.other_personnel.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TechAidError::InvalidTransition {
            action: "assigned",
            ..
        }
    ));
}

#[tokio::test]
async fn reassigning_active_ticket_follows_policy() {
    let (fx, _) = setup().await;
    let ticket = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    fx.service.assign(ticket.id, fx.personnel.id).await.unwrap();
    assert!(matches!(
        fx.service.assign(ticket.id, fx.other_personnel.id).await,
        Err(TechAidError::InvalidTransition { .. })
    ));

    let permissive = setup_with(
        RecordingNotifier::default(),
        AssignmentPolicy {
            allow_reassign_active: true,
        },
    )
    .await;
    let ticket = permissive
        .service
        .create(software_ticket(permissive.requester.id))
        .await
        .unwrap();
    permissive
        .service
        .assign(ticket.id, permissive.personnel.id)
        .await
        .unwrap();
    let moved = permissive
        .service
        .assign(ticket.id, permissive.other_personnel.id)
        .await
        .unwrap();
    assert_eq!(moved.ticket.assignee_id, Some(permissive.other_personnel.id));
}

#[tokio::test]
async fn only_it_personnel_can_be_assigned() {
    let (fx, _) = setup().await;
    let ticket = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();

    assert!(matches!(
        fx.service.assign(ticket.id, fx.requester.id).await,
        Err(TechAidError::Validation { .. })
    ));
    assert!(matches!(
        fx.service.assign(ticket.id, Uuid::new_v4()).await,
        Err(TechAidError::NotFound { .. })
    ));
    assert!(matches!(
        fx.service.assign(404, fx.personnel.id).await,
        Err(TechAidError::NotFound { .. })
    ));
}

#[tokio::test]
async fn email_failure_is_partial_success() {
    let fx = setup_with(FailingNotifier, AssignmentPolicy::default()).await;
    let ticket = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();

    let assigned = fx.service.assign(ticket.id, fx.personnel.id).await.unwrap();
    assert_eq!(assigned.ticket.status, Status::Active);
    assert!(matches!(assigned.notification, Delivery::Failed(_)));
    assert!(
        assigned
            .message
            .starts_with("Ticket assigned, but email sending failed:")
    );

    let completed = fx
        .service
        .complete(fx.personnel.id, ticket.id, "rebooted".into())
        .await
        .unwrap();
    assert_eq!(completed.ticket.status, Status::Completed);
    assert!(
        completed
            .message
            .starts_with("Ticket marked as completed, but email failed:")
    );
}

#[tokio::test]
async fn create_validates_input() {
    let (fx, _) = setup().await;

    assert!(matches!(
        fx.service.create(software_ticket(Uuid::new_v4())).await,
        Err(TechAidError::NotFound { .. })
    ));

    let mut blank = software_ticket(fx.requester.id);
    blank.subject = "  ".into();
    assert!(matches!(
        fx.service.create(blank).await,
        Err(TechAidError::Validation { .. })
    ));
}

#[tokio::test]
async fn bank_staff_only_see_their_own_tickets() {
    let (fx, _) = setup().await;
    let mine = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    let theirs = fx
        .service
        .create(software_ticket(fx.personnel.id))
        .await
        .unwrap();

    let staff = Actor::new(fx.requester.id, Role::BankStaff);
    assert!(fx.service.get(&staff, mine.id).await.is_ok());
    assert!(matches!(
        fx.service.get(&staff, theirs.id).await,
        Err(TechAidError::NotFound { .. })
    ));

    let personnel = Actor::new(fx.personnel.id, Role::ItPersonnel);
    assert!(fx.service.get(&personnel, mine.id).await.is_ok());

    let visible = fx
        .service
        .search(TicketScope::for_actor(&staff), &query("none"))
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].ticket_id, mine.id);
}

#[tokio::test]
async fn queue_lists_unassigned_tickets_from_every_requester() {
    let (fx, _) = setup().await;
    let first = fx
        .service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    let second = fx
        .service
        .create(software_ticket(fx.admin.id))
        .await
        .unwrap();
    fx.service.assign(first.id, fx.personnel.id).await.unwrap();

    let mut asked_for_active = query("month");
    asked_for_active.criteria.status = Some(Status::Active);
    let queue = fx.service.queue(&asked_for_active).await.unwrap();
    let ids: Vec<i64> = queue.iter().map(|v| v.ticket_id).collect();
    assert_eq!(ids, vec![second.id]);
    assert_eq!(queue[0].status, Status::NotActive);
}

#[tokio::test]
async fn search_and_count_resolve_filters() {
    let (fx, _) = setup().await;
    fx.service
        .create(software_ticket(fx.requester.id))
        .await
        .unwrap();
    let mut urgent = software_ticket(fx.requester.id);
    urgent.priority = Priority::High;
    fx.service.create(urgent).await.unwrap();

    let today = fx
        .service
        .search(TicketScope::All, &query("DAY"))
        .await
        .unwrap();
    assert_eq!(today.len(), 2);

    let other_day = TicketQuery {
        filter: "set".into(),
        date: NaiveDate::from_ymd_opt(2025, 3, 4),
        ..TicketQuery::default()
    };
    assert!(
        fx.service
            .search(TicketScope::All, &other_day)
            .await
            .unwrap()
            .is_empty()
    );

    let high = TicketQuery {
        filter: "month".into(),
        criteria: TicketCriteria {
            priority: Some(Priority::High),
            ..TicketCriteria::default()
        },
        ..TicketQuery::default()
    };
    let counts = fx.service.count(TicketScope::All, &high).await.unwrap();
    assert_eq!(counts.total, 1);
    assert_eq!(counts.not_active, 1);
    assert!(counts.is_consistent());

    assert!(matches!(
        fx.service.count(TicketScope::All, &query("set")).await,
        Err(TechAidError::InvalidFilter(_))
    ));
    assert!(matches!(
        fx.service.search(TicketScope::All, &query("fortnight")).await,
        Err(TechAidError::InvalidFilter(_))
    ));
}

#[tokio::test]
async fn monthly_analytics_add_up_to_the_total() {
    let (fx, _) = setup().await;
    for _ in 0..3 {
        fx.service
            .create(software_ticket(fx.requester.id))
            .await
            .unwrap();
    }

    let month = fx
        .service
        .analytics(TicketScope::All, &query("month"))
        .await
        .unwrap();
    let AnalyticsReport::Weekly(weeks) = &month else {
        panic!("month should break down by week");
    };
    assert_eq!(weeks.len(), 4);
    assert_eq!(weeks[1].counts.total, 3);
    assert_eq!(
        weeks[3].end,
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    );

    let all = fx
        .service
        .analytics(TicketScope::All, &query("none"))
        .await
        .unwrap();
    assert_eq!(month.total(), all.total());

    let week = fx
        .service
        .analytics(TicketScope::All, &query("week"))
        .await
        .unwrap();
    let AnalyticsReport::Daily(days) = week else {
        panic!("week should break down by day");
    };
    assert_eq!(days.len(), 7);
    assert_eq!(days[2].day, "Wednesday");
    assert_eq!(days[2].counts.total, 3);

    assert!(matches!(
        fx.service
            .analytics(TicketScope::All, &query("week5"))
            .await,
        Err(TechAidError::InvalidFilter(_))
    ));
}
