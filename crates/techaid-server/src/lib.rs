//! TechAid server: configuration, application state and the HTTP API.

pub mod api;
pub mod config;
pub mod state;

pub use api::router;
pub use config::AppConfig;
pub use state::AppState;
