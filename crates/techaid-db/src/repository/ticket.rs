//! SurrealDB implementation of [`TicketRepository`].
//!
//! Ticket ids are integer record keys drawn from the `ticket_sequence`
//! counter. Lifecycle transitions are single conditional `UPDATE`
//! statements, so a transition either applies against the expected state
//! or touches nothing.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use techaid_core::error::{TechAidError, TechAidResult};
use techaid_core::models::actor::TicketScope;
use techaid_core::models::enums::Status;
use techaid_core::models::stats::StatusCounts;
use techaid_core::models::ticket::{Contact, NewTicket, Ticket, TicketStamp, TicketView};
use techaid_core::repository::{TicketFilter, TicketRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TicketRow {
    subject: String,
    description: String,
    attachment: Option<String>,
    category: String,
    department: String,
    priority: String,
    status: String,
    requester_id: String,
    assignee_id: Option<String>,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TicketRowWithId {
    record_id: i64,
    subject: String,
    description: String,
    attachment: Option<String>,
    category: String,
    department: String,
    priority: String,
    status: String,
    requester_id: String,
    assignee_id: Option<String>,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ContactRow {
    record_id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
}

#[derive(Debug, SurrealValue)]
struct StampRow {
    created_at: DateTime<Utc>,
    status: String,
}

#[derive(Debug, SurrealValue)]
struct CountsRow {
    total: u64,
    active: u64,
    not_active: u64,
    completed: u64,
}

#[derive(Debug, SurrealValue)]
struct SequenceRow {
    last_id: i64,
}

fn parse_enum<T>(field: &str, value: &str) -> Result<T, DbError>
where
    T: FromStr<Err = TechAidError>,
{
    value
        .parse()
        .map_err(|_| DbError::Decode(format!("invalid {field}: {value}")))
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

impl TicketRow {
    fn into_ticket(self, id: i64) -> Result<Ticket, DbError> {
        Ok(Ticket {
            id,
            subject: self.subject,
            description: self.description,
            attachment: self.attachment,
            category: parse_enum("category", &self.category)?,
            department: parse_enum("department", &self.department)?,
            priority: parse_enum("priority", &self.priority)?,
            status: parse_enum("status", &self.status)?,
            requester_id: parse_uuid("requester", &self.requester_id)?,
            assignee_id: self
                .assignee_id
                .as_deref()
                .map(|a| parse_uuid("assignee", a))
                .transpose()?,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TicketRowWithId {
    fn try_into_ticket(self) -> Result<Ticket, DbError> {
        let id = self.record_id;
        TicketRow {
            subject: self.subject,
            description: self.description,
            attachment: self.attachment,
            category: self.category,
            department: self.department,
            priority: self.priority,
            status: self.status,
            requester_id: self.requester_id,
            assignee_id: self.assignee_id,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_ticket(id)
    }
}

/// A `WHERE` clause plus the `$filter` object it reads its values from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Predicate {
    pub clause: String,
    pub params: Value,
}

/// Build the ticket predicate for a filter. Only the supplied parts
/// contribute a condition; an empty filter yields an empty clause.
pub(crate) fn compose_predicate(filter: &TicketFilter) -> Predicate {
    let mut conditions: Vec<&'static str> = Vec::new();
    let mut params = Map::new();

    if let TicketScope::Involving(actor) = filter.scope {
        conditions.push("(requester_id = $filter.actor OR assignee_id = $filter.actor)");
        params.insert("actor".into(), json!(actor.to_string()));
    }

    if let Some((start, end)) = filter.window.instant_bounds() {
        conditions.push("created_at >= <datetime> $filter.start");
        conditions.push("created_at < <datetime> $filter.end");
        params.insert("start".into(), json!(start.to_rfc3339()));
        params.insert("end".into(), json!(end.to_rfc3339()));
    }

    let criteria = &filter.criteria;
    if let Some(status) = criteria.status {
        conditions.push("status = $filter.status");
        params.insert("status".into(), json!(status.as_str()));
    }
    if let Some(priority) = criteria.priority {
        conditions.push("priority = $filter.priority");
        params.insert("priority".into(), json!(priority.as_str()));
    }
    if let Some(category) = criteria.category {
        conditions.push("category = $filter.category");
        params.insert("category".into(), json!(category.as_str()));
    }
    if let Some(department) = criteria.department {
        conditions.push("department = $filter.department");
        params.insert("department".into(), json!(department.as_str()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    Predicate {
        clause,
        params: Value::Object(params),
    }
}

/// Attempts per write before a conflict is reported to the caller.
const CONFLICT_ATTEMPTS: usize = 16;

/// Run `op` again while it fails with a transaction conflict. Guarded
/// updates stay correct on rerun: a loser re-reads the winner's state and
/// matches nothing.
async fn retry_on_conflict<T, F, Fut>(mut op: F) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_conflict() && attempt < CONFLICT_ATTEMPTS => {
                debug!(attempt, error = %e, "Retrying after transaction conflict");
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// SurrealDB implementation of the Ticket repository.
#[derive(Clone)]
pub struct SurrealTicketRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTicketRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn next_id(&self) -> Result<i64, DbError> {
        retry_on_conflict(|| self.bump_sequence()).await
    }

    async fn bump_sequence(&self) -> Result<i64, DbError> {
        let result = self
            .db
            .query(
                "UPSERT type::record('ticket_sequence', 'ticket') \
                 SET last_id += 1 RETURN last_id",
            )
            .await?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<SequenceRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.last_id)
            .ok_or_else(|| DbError::Query("ticket sequence returned no value".into()))
    }

    async fn guarded_assign(
        &self,
        id: i64,
        assignee_id: String,
        allowed: Vec<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, DbError> {
        let result = self
            .db
            .query(
                "UPDATE type::record('ticket', $id) SET \
                 status = 'ACTIVE', assignee_id = $assignee_id, \
                 updated_at = $at \
                 WHERE status IN $allowed",
            )
            .bind(("id", id))
            .bind(("assignee_id", assignee_id))
            .bind(("allowed", allowed))
            .bind(("at", at))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("ticket", e))?;

        let rows: Vec<TicketRow> = result.take(0)?;
        first_updated(rows, id)
    }

    async fn guarded_complete(
        &self,
        id: i64,
        actor_id: String,
        comment: String,
        at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, DbError> {
        let result = self
            .db
            .query(
                "UPDATE type::record('ticket', $id) SET \
                 status = 'COMPLETED', comment = $comment, \
                 updated_at = $at \
                 WHERE status = 'ACTIVE' AND assignee_id = $actor_id",
            )
            .bind(("id", id))
            .bind(("actor_id", actor_id))
            .bind(("comment", comment))
            .bind(("at", at))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("ticket", e))?;

        let rows: Vec<TicketRow> = result.take(0)?;
        first_updated(rows, id)
    }

    /// Look up contact details for the given employee ids. Ids with no
    /// matching employee are absent from the map.
    async fn contacts(&self, ids: HashSet<String>) -> Result<HashMap<String, Contact>, DbError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<String> = ids.into_iter().collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, first_name, last_name, \
                 email, phone_number FROM employee \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await?;
        let rows: Vec<ContactRow> = result.take(0)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.record_id,
                    Contact {
                        first_name: row.first_name,
                        last_name: row.last_name,
                        email: row.email,
                        phone_number: row.phone_number,
                    },
                )
            })
            .collect())
    }

    async fn project(&self, tickets: Vec<Ticket>) -> Result<Vec<TicketView>, DbError> {
        let ids: HashSet<String> = tickets
            .iter()
            .flat_map(|t| std::iter::once(t.requester_id).chain(t.assignee_id))
            .map(|id| id.to_string())
            .collect();
        let contacts = self.contacts(ids).await?;
        let lookup = |id: Uuid| contacts.get(&id.to_string()).cloned();

        Ok(tickets
            .into_iter()
            .map(|t| TicketView {
                ticket_id: t.id,
                requester: lookup(t.requester_id),
                assignee: t.assignee_id.and_then(lookup),
                subject: t.subject,
                description: t.description,
                attachment: t.attachment,
                category: t.category,
                department: t.department,
                priority: t.priority,
                status: t.status,
                comment: t.comment,
                created_at: t.created_at,
                updated_at: t.updated_at,
            })
            .collect())
    }
}

/// The first row returned by a conditional update, if the guard matched.
fn first_updated(rows: Vec<TicketRow>, id: i64) -> Result<Option<Ticket>, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_ticket(id))
        .transpose()
}

impl<C: Connection> TicketRepository for SurrealTicketRepository<C> {
    async fn create(&self, input: NewTicket) -> TechAidResult<Ticket> {
        let id = self.next_id().await?;

        let result = self
            .db
            .query(
                "CREATE type::record('ticket', $id) SET \
                 subject = $subject, description = $description, \
                 attachment = $attachment, category = $category, \
                 department = $department, priority = $priority, \
                 status = 'NOT_ACTIVE', requester_id = $requester_id, \
                 assignee_id = NONE, comment = NONE, \
                 created_at = $created_at, updated_at = $created_at",
            )
            .bind(("id", id))
            .bind(("subject", input.subject))
            .bind(("description", input.description))
            .bind(("attachment", input.attachment))
            .bind(("category", input.category.as_str().to_string()))
            .bind(("department", input.department.as_str().to_string()))
            .bind(("priority", input.priority.as_str().to_string()))
            .bind(("requester_id", input.requester_id.to_string()))
            .bind(("created_at", input.created_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("ticket", e))?;

        let rows: Vec<TicketRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id.to_string(),
        })?;

        debug!(ticket_id = id, "Ticket stored");
        Ok(row.into_ticket(id)?)
    }

    async fn get_by_id(&self, id: i64) -> TechAidResult<Ticket> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('ticket', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TicketRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_ticket(id)?)
    }

    async fn get_view(&self, id: i64) -> TechAidResult<TicketView> {
        let ticket = self.get_by_id(id).await?;
        let views = self.project(vec![ticket]).await?;
        views
            .into_iter()
            .next()
            .ok_or_else(|| TechAidError::not_found("ticket", id))
    }

    async fn search(&self, filter: &TicketFilter) -> TechAidResult<Vec<TicketView>> {
        let predicate = compose_predicate(filter);
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM ticket{} \
             ORDER BY created_at DESC",
            predicate.clause
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("filter", predicate.params))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TicketRowWithId> = result.take(0).map_err(DbError::from)?;
        let tickets = rows
            .into_iter()
            .map(|row| row.try_into_ticket())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(self.project(tickets).await?)
    }

    async fn count(&self, filter: &TicketFilter) -> TechAidResult<StatusCounts> {
        let predicate = compose_predicate(filter);
        let query = format!(
            "SELECT count() AS total, \
             count(status = 'ACTIVE') AS active, \
             count(status = 'NOT_ACTIVE') AS not_active, \
             count(status = 'COMPLETED') AS completed \
             FROM ticket{} GROUP ALL",
            predicate.clause
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("filter", predicate.params))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountsRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .first()
            .map(|r| StatusCounts {
                total: r.total,
                active: r.active,
                not_active: r.not_active,
                completed: r.completed,
            })
            .unwrap_or_default())
    }

    async fn list_stamps(&self, filter: &TicketFilter) -> TechAidResult<Vec<TicketStamp>> {
        let predicate = compose_predicate(filter);
        let query = format!(
            "SELECT created_at, status FROM ticket{} ORDER BY created_at ASC",
            predicate.clause
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("filter", predicate.params))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StampRow> = result.take(0).map_err(DbError::from)?;
        let stamps = rows
            .into_iter()
            .map(|row| {
                Ok(TicketStamp {
                    created_at: row.created_at,
                    status: parse_enum::<Status>("status", &row.status)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(stamps)
    }

    async fn assign_if(
        &self,
        id: i64,
        assignee_id: Uuid,
        allowed: &[Status],
        at: DateTime<Utc>,
    ) -> TechAidResult<Option<Ticket>> {
        let allowed: Vec<String> = allowed.iter().map(|s| s.as_str().to_string()).collect();
        let assignee_id = assignee_id.to_string();
        Ok(retry_on_conflict(|| {
            self.guarded_assign(id, assignee_id.clone(), allowed.clone(), at)
        })
        .await?)
    }

    async fn complete_if(
        &self,
        id: i64,
        actor_id: Uuid,
        comment: String,
        at: DateTime<Utc>,
    ) -> TechAidResult<Option<Ticket>> {
        let actor_id = actor_id.to_string();
        Ok(retry_on_conflict(|| {
            self.guarded_complete(id, actor_id.clone(), comment.clone(), at)
        })
        .await?)
    }
}
