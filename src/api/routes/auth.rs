//! Login and session endpoints

use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::TokenService;
use crate::domain::CallerContext;
use crate::error::AppError;
use crate::handlers::{AdminLoginCommand, AuthHandler, AuthResult, OtpIssued};
use crate::state::{AppState, OtpSettings};

// =========================================================================
// Request types
// =========================================================================

/// Missing fields deserialize as empty and are rejected by the handler with
/// a 400.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestOtpRequest {
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub otp: String,
}

pub(super) fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/admin/login", post(admin_login))
        .route("/auth/customer/request-otp", post(request_otp))
        .route("/auth/customer/verify-otp", post(verify_otp))
}

pub(super) fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

// =========================================================================
// POST /auth/admin/login
// =========================================================================

async fn admin_login(
    State(pool): State<PgPool>,
    State(tokens): State<TokenService>,
    State(otp): State<OtpSettings>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AuthResult>, AppError> {
    let handler = AuthHandler::new(pool, tokens, otp);
    let command = AdminLoginCommand {
        phone: request.phone,
        password: request.password,
    };

    Ok(Json(handler.admin_login(command).await?))
}

// =========================================================================
// POST /auth/customer/request-otp
// =========================================================================

async fn request_otp(
    State(pool): State<PgPool>,
    State(tokens): State<TokenService>,
    State(otp): State<OtpSettings>,
    Json(request): Json<RequestOtpRequest>,
) -> Result<Json<OtpIssued>, AppError> {
    let handler = AuthHandler::new(pool, tokens, otp);
    Ok(Json(handler.request_otp(&request.phone).await?))
}

// =========================================================================
// POST /auth/customer/verify-otp
// =========================================================================

async fn verify_otp(
    State(pool): State<PgPool>,
    State(tokens): State<TokenService>,
    State(otp): State<OtpSettings>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResult>, AppError> {
    let handler = AuthHandler::new(pool, tokens, otp);
    Ok(Json(handler.verify_otp(&request.phone, &request.otp).await?))
}

// =========================================================================
// GET /auth/me
// =========================================================================

async fn me(
    State(pool): State<PgPool>,
    State(tokens): State<TokenService>,
    State(otp): State<OtpSettings>,
    Extension(context): Extension<CallerContext>,
) -> Result<Json<Value>, AppError> {
    let handler = AuthHandler::new(pool, tokens, otp);
    let user = handler.me(&context).await?;

    Ok(Json(json!({ "user": user })))
}
