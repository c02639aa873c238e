//! SurrealDB repository implementations.

mod employee;
mod ticket;

pub use employee::{SurrealEmployeeRepository, verify_password};
pub use ticket::SurrealTicketRepository;
