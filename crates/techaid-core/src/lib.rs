//! Core domain types for the TechAid help desk.

pub mod clock;
pub mod error;
pub mod models;
pub mod notify;
pub mod repository;
pub mod window;

pub use error::{TechAidError, TechAidResult};
