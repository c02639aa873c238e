//! Employee lookup, self-service profile updates and admin deletion.

use serde::Deserialize;
use techaid_core::error::TechAidResult;
use techaid_core::models::actor::Actor;
use techaid_core::models::employee::{Employee, UpdateEmployee, check_password_length};
use techaid_core::models::enums::{Department, Role};
use techaid_core::repository::{EmployeeRepository, PaginatedResult, Pagination};
use tracing::info;
use uuid::Uuid;

/// Fields an employee may change on their own record. Blank strings are
/// treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub department: Option<Department>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProfileUpdate {
    fn into_update(self) -> UpdateEmployee {
        UpdateEmployee {
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            phone_number: non_blank(self.phone_number),
            // Passwords are not trimmed, only checked for emptiness.
            password: self.password.filter(|p| !p.is_empty()),
            department: self.department,
            ..Default::default()
        }
    }
}

pub struct EmployeeService<E: EmployeeRepository> {
    employees: E,
    min_password_length: usize,
}

impl<E: EmployeeRepository> EmployeeService<E> {
    pub fn new(employees: E, min_password_length: usize) -> Self {
        Self {
            employees,
            min_password_length,
        }
    }

    pub async fn get(&self, id: Uuid) -> TechAidResult<Employee> {
        self.employees.get_by_id(id).await
    }

    pub async fn list(&self, pagination: Pagination) -> TechAidResult<PaginatedResult<Employee>> {
        self.employees.list(pagination).await
    }

    /// Apply `update` to the actor's own record.
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        update: ProfileUpdate,
    ) -> TechAidResult<Employee> {
        let update = update.into_update();
        if let Some(password) = &update.password {
            check_password_length(password, self.min_password_length)?;
        }

        let employee = self.employees.update(actor_id, update).await?;
        info!(employee_id = %actor_id, "Profile updated");
        Ok(employee)
    }

    /// Remove an employee and every ticket they requested; their active
    /// assignments go back to the queue. Admin only.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> TechAidResult<()> {
        actor.require_role(&[Role::Admin])?;
        self.employees.delete(id).await?;
        info!(employee_id = %id, deleted_by = %actor.id, "Employee deleted");
        Ok(())
    }
}
