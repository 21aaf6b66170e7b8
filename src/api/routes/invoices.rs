//! Invoice endpoints

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CallerContext, LineRequest};
use crate::error::AppError;
use crate::handlers::{
    CreateInvoiceCommand, CreateInvoiceHandler, DeleteInvoiceHandler, UpdateInvoiceCommand,
    UpdateInvoiceHandler,
};
use crate::state::AppState;
use crate::store::InvoiceRepository;

// =========================================================================
// Request types
// =========================================================================

/// Body of both create and update.
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    #[serde(default, alias = "partyId")]
    pub party_id: Option<Uuid>,
    #[serde(default, alias = "items")]
    pub lines: Vec<LineRequest>,
}

impl InvoiceRequest {
    fn required_party_id(&self) -> Result<Uuid, AppError> {
        self.party_id
            .ok_or_else(|| AppError::InvalidRequest("party_id is required".to_string()))
    }
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/:invoice_id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
}

// =========================================================================
// GET /invoices
// =========================================================================

async fn list_invoices(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
) -> Result<Json<Value>, AppError> {
    let invoices = InvoiceRepository::new(pool)
        .list(context.owner_id())
        .await?;

    Ok(Json(json!({ "invoices": invoices })))
}

// =========================================================================
// GET /invoices/:invoice_id
// =========================================================================

async fn get_invoice(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let invoice = InvoiceRepository::new(pool)
        .find_detail(context.owner_id(), invoice_id)
        .await?
        .ok_or_else(|| AppError::InvoiceNotFound(invoice_id.to_string()))?;

    Ok(Json(json!({ "invoice": invoice })))
}

// =========================================================================
// POST /invoices
// =========================================================================

async fn create_invoice(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Json(request): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let handler = CreateInvoiceHandler::new(pool);
    let command = CreateInvoiceCommand::new(request.required_party_id()?, request.lines);

    let invoice = handler.execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(json!({ "invoice": invoice }))))
}

// =========================================================================
// PUT /invoices/:invoice_id
// =========================================================================

async fn update_invoice(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<InvoiceRequest>,
) -> Result<Json<Value>, AppError> {
    let handler = UpdateInvoiceHandler::new(pool);
    let command = UpdateInvoiceCommand::new(invoice_id, request.required_party_id()?, request.lines);

    let invoice = handler.execute(command, &context).await?;

    Ok(Json(json!({ "invoice": invoice })))
}

// =========================================================================
// DELETE /invoices/:invoice_id
// =========================================================================

async fn delete_invoice(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let handler = DeleteInvoiceHandler::new(pool);
    let deleted = handler.execute(invoice_id, &context).await?;

    Ok(Json(json!({ "deleted": deleted })))
}
