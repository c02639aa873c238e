//! SurrealDB implementation of [`EmployeeRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.
//!
//! Emails are stored lowercase, so lookups are case-insensitive.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use techaid_core::error::TechAidResult;
use techaid_core::models::employee::{CreateEmployee, Employee, UpdateEmployee};
use techaid_core::models::enums::{Department, Role};
use techaid_core::repository::{EmployeeRepository, PaginatedResult, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct EmployeeRow {
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    role: String,
    department: Option<String>,
    refresh_token_hash: Option<String>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct EmployeeRowWithId {
    record_id: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    role: String,
    department: Option<String>,
    refresh_token_hash: Option<String>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown role: {s}")))
}

fn parse_department(s: Option<&str>) -> Result<Option<Department>, DbError> {
    s.map(|d| {
        d.parse()
            .map_err(|_| DbError::Decode(format!("unknown department: {d}")))
    })
    .transpose()
}

impl EmployeeRow {
    fn into_employee(self, id: Uuid) -> Result<Employee, DbError> {
        Ok(Employee {
            id,
            role: parse_role(&self.role)?,
            department: parse_department(self.department.as_deref())?,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            refresh_token_hash: self.refresh_token_hash,
            refresh_token_expires_at: self.refresh_token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl EmployeeRowWithId {
    fn try_into_employee(self) -> Result<Employee, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Employee {
            id,
            role: parse_role(&self.role)?,
            department: parse_department(self.department.as_deref())?,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            refresh_token_hash: self.refresh_token_hash,
            refresh_token_expires_at: self.refresh_token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn peppered_input<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered_input(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash.
///
/// Public for use by the auth layer.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    use argon2::PasswordVerifier;

    let mut buf = String::new();
    let input = peppered_input(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Hash(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Hash(format!("verify error: {e}"))),
    }
}

/// SurrealDB implementation of the Employee repository.
#[derive(Clone)]
pub struct SurrealEmployeeRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealEmployeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn find_one(
        &self,
        condition: &str,
        param: (&'static str, String),
        label: String,
    ) -> Result<Employee, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM employee WHERE {condition}"
        );
        let mut result = self.db.query(&query).bind(param).await?;

        let rows: Vec<EmployeeRowWithId> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: label,
        })?;

        row.try_into_employee()
    }
}

impl<C: Connection> EmployeeRepository for SurrealEmployeeRepository<C> {
    async fn create(&self, input: CreateEmployee) -> TechAidResult<Employee> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('employee', $id) SET \
                 email = $email, password_hash = $password_hash, \
                 first_name = $first_name, last_name = $last_name, \
                 phone_number = $phone_number, role = $role, \
                 department = $department, \
                 refresh_token_hash = NONE, \
                 refresh_token_expires_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email.trim().to_lowercase()))
            .bind(("password_hash", password_hash))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("phone_number", input.phone_number))
            .bind(("role", input.role.as_str().to_string()))
            .bind((
                "department",
                input.department.map(|d| d.as_str().to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("employee", e))?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.into_employee(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TechAidResult<Employee> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('employee', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.into_employee(id)?)
    }

    async fn get_by_email(&self, email: &str) -> TechAidResult<Employee> {
        let email = email.trim().to_lowercase();
        let label = format!("email={email}");
        Ok(self
            .find_one("email = $email", ("email", email), label)
            .await?)
    }

    async fn get_by_refresh_token_hash(&self, hash: &str) -> TechAidResult<Employee> {
        Ok(self
            .find_one(
                "refresh_token_hash = $hash",
                ("hash", hash.to_string()),
                "refresh_token".into(),
            )
            .await?)
    }

    async fn update(&self, id: Uuid, input: UpdateEmployee) -> TechAidResult<Employee> {
        let id_str = id.to_string();

        let password_hash = input
            .password
            .as_deref()
            .map(|p| hash_password(p, self.pepper.as_deref()))
            .transpose()?;

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.phone_number.is_some() {
            sets.push("phone_number = $phone_number");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.refresh_token_hash.is_some() {
            sets.push("refresh_token_hash = $refresh_token_hash");
        }
        if input.refresh_token_expires_at.is_some() {
            sets.push("refresh_token_expires_at = $refresh_token_expires_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('employee', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(phone_number) = input.phone_number {
            builder = builder.bind(("phone_number", phone_number));
        }
        if let Some(password_hash) = password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department.as_str().to_string()));
        }
        if let Some(refresh_token_hash) = input.refresh_token_hash {
            // Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("refresh_token_hash", refresh_token_hash));
        }
        if let Some(expires_at) = input.refresh_token_expires_at {
            builder = builder.bind(("refresh_token_expires_at", expires_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("employee", e))?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.into_employee(id)?)
    }

    async fn delete(&self, id: Uuid) -> TechAidResult<()> {
        // Surface NotFound before cascading.
        self.get_by_id(id).await?;

        // Work in progress goes back to the queue; completed tickets keep
        // their historical assignee.
        let id_str = id.to_string();
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE ticket WHERE requester_id = $id; \
                 UPDATE ticket SET status = 'NOT_ACTIVE', assignee_id = NONE, \
                 updated_at = time::now() \
                 WHERE assignee_id = $id AND status = 'ACTIVE'; \
                 DELETE type::record('employee', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(employee_id = %id_str, "Employee deleted, requested tickets removed and active assignments released");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> TechAidResult<PaginatedResult<Employee>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM employee GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_employee())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
