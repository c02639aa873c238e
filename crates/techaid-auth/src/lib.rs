//! TechAid Auth: employee registration, password login, JWT
//! issuance/validation and refresh-token rotation.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, RegisterInput, TokenPair};
pub use token::{AccessTokenClaims, ValidatedClaims};
