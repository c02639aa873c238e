//! Authentication service: registration, login, token refresh and logout.

use chrono::{Duration, Utc};
use serde::Serialize;
use techaid_core::error::{TechAidError, TechAidResult};
use techaid_core::models::actor::Actor;
use techaid_core::models::employee::{
    CreateEmployee, Employee, UpdateEmployee, check_password_length,
};
use techaid_core::models::enums::{Department, Role};
use techaid_core::repository::EmployeeRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for employee registration.
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub department: Option<Department>,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Access token plus the opaque refresh token that renews it.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub employee_id: Uuid,
    pub role: Role,
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw refresh token (returned to the client, only its hash is stored).
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over the employee repository so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<E: EmployeeRepository> {
    employees: E,
    config: AuthConfig,
}

impl<E: EmployeeRepository> AuthService<E> {
    pub fn new(employees: E, config: AuthConfig) -> Self {
        Self { employees, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create an employee account after checking the email domain, the
    /// password policy and email uniqueness.
    pub async fn register(&self, input: RegisterInput) -> TechAidResult<Employee> {
        let email = input.email.trim().to_lowercase();
        let domain = self.config.allowed_email_domain.to_lowercase();
        if !email.ends_with(&domain) {
            return Err(AuthError::EmailDomainNotAllowed(domain).into());
        }
        check_password_length(&input.password, self.config.min_password_length)?;
        if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
            return Err(TechAidError::validation("first and last name are required"));
        }

        match self.employees.get_by_email(&email).await {
            Ok(_) => {
                return Err(TechAidError::AlreadyExists {
                    entity: "employee".into(),
                });
            }
            Err(TechAidError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let employee = self
            .employees
            .create(CreateEmployee {
                email,
                password: input.password,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                phone_number: input.phone_number,
                role: input.role,
                department: input.department,
            })
            .await?;

        info!(employee_id = %employee.id, role = %employee.role, "Employee registered");
        Ok(employee)
    }

    /// Verify email + password and issue a fresh token pair.
    pub async fn login(&self, input: LoginInput) -> TechAidResult<TokenPair> {
        let employee = match self.employees.get_by_email(&input.email).await {
            Ok(e) => e,
            Err(TechAidError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &employee.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            warn!(employee_id = %employee.id, "Login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = self.issue_pair(&employee).await?;
        info!(employee_id = %employee.id, "Employee logged in");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// consumed: its stored hash is replaced by the new one.
    pub async fn refresh(&self, raw_refresh_token: &str) -> TechAidResult<TokenPair> {
        let hash = token::hash_refresh_token(raw_refresh_token);
        let employee = match self.employees.get_by_refresh_token_hash(&hash).await {
            Ok(e) => e,
            Err(TechAidError::NotFound { .. }) => {
                return Err(AuthError::RefreshTokenRejected.into());
            }
            Err(e) => return Err(e),
        };

        let live = employee
            .refresh_token_expires_at
            .is_some_and(|expires_at| expires_at > Utc::now());
        if !live {
            self.clear_refresh(employee.id).await?;
            return Err(AuthError::RefreshTokenRejected.into());
        }

        self.issue_pair(&employee).await
    }

    /// Forget the employee's refresh token. Access tokens already issued
    /// stay valid until they expire.
    pub async fn logout(&self, employee_id: Uuid) -> TechAidResult<()> {
        self.clear_refresh(employee_id).await?;
        info!(employee_id = %employee_id, "Employee logged out");
        Ok(())
    }

    /// Resolve a bearer token to the calling actor.
    pub fn authenticate(&self, bearer: &str) -> TechAidResult<Actor> {
        let claims = token::validate_access_token(bearer, &self.config)?;
        Ok(claims.actor()?)
    }

    async fn issue_pair(&self, employee: &Employee) -> TechAidResult<TokenPair> {
        let access_token = token::issue_access_token(employee.id, employee.role, &self.config)?;
        let refresh_token = token::generate_refresh_token();
        let lifetime = i64::try_from(self.config.refresh_token_lifetime_secs)
            .map_err(|_| TechAidError::Internal("refresh token lifetime out of range".into()))?;
        let expires_at = Utc::now() + Duration::seconds(lifetime);

        self.employees
            .update(
                employee.id,
                UpdateEmployee {
                    refresh_token_hash: Some(Some(token::hash_refresh_token(&refresh_token))),
                    refresh_token_expires_at: Some(Some(expires_at)),
                    ..Default::default()
                },
            )
            .await?;

        Ok(TokenPair {
            employee_id: employee.id,
            role: employee.role,
            access_token,
            refresh_token,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    async fn clear_refresh(&self, employee_id: Uuid) -> TechAidResult<()> {
        self.employees
            .update(
                employee_id,
                UpdateEmployee {
                    refresh_token_hash: Some(None),
                    refresh_token_expires_at: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}
