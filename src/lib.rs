//! SIISA Billing Library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod state;
pub mod store;

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use domain::{CallerContext, DomainError, Role};
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Build the application router
///
/// Layers run outermost first: CORS, trace, request logging, then per-route
/// bearer authentication inside `/api`.
pub fn build_router(state: AppState) -> Router {
    let api_router = api::create_router(&state);

    Router::new()
        .merge(api::health_router())
        .nest("/api", api_router)
        .layer(middleware::from_fn(api::middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
