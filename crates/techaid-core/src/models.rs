//! Domain models for TechAid.
//!
//! These are the core types shared across all crates.

pub mod actor;
pub mod employee;
pub mod enums;
pub mod stats;
pub mod ticket;
