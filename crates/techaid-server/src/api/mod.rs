//! REST API: routing, extractors and handlers.

mod auth;
mod employees;
pub mod error;
pub mod extract;
mod tickets;

use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => layer.allow_origin(value),
        Some(Err(e)) => {
            warn!(error = %e, "Invalid CORS origin; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

/// Build the application router.
pub fn router(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(employees::routes())
        .merge(tickets::routes())
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
