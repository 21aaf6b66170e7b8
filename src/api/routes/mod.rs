//! API Routes
//!
//! HTTP endpoint definitions, grouped by resource.

mod auth;
mod invoices;
mod items;
mod parties;

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

use super::middleware::auth_middleware;

pub use auth::{AdminLoginRequest, RequestOtpRequest, VerifyOtpRequest};
pub use invoices::InvoiceRequest;
pub use items::{CreateItemRequest, ItemsQuery, UpdateItemRequest};
pub use parties::{CreatePartyRequest, PartiesQuery, UpdatePartyRequest};

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Everything except the login endpoints requires a
/// bearer token.
pub fn create_router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(items::routes())
        .merge(parties::routes())
        .merge(invoices::routes())
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth_middleware,
        ));

    Router::new().merge(auth::public_routes()).merge(protected)
}

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Router for `/health`
pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
