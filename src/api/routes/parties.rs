//! Party endpoints

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::CallerContext;
use crate::error::AppError;
use crate::handlers::{CreatePartyCommand, PartyHandler, UpdatePartyCommand};
use crate::state::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PartiesQuery {
    #[serde(default, rename = "type")]
    pub party_type: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, rename = "type", alias = "party_type")]
    pub party_type: String,
    #[serde(default)]
    pub gst: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePartyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "type", alias = "party_type")]
    pub party_type: Option<String>,
    #[serde(default)]
    pub gst: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/parties", get(list_parties).post(create_party))
        .route("/parties/:party_id", put(update_party).delete(delete_party))
}

// =========================================================================
// GET /parties
// =========================================================================

async fn list_parties(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Query(query): Query<PartiesQuery>,
) -> Result<Json<Value>, AppError> {
    let handler = PartyHandler::new(pool);
    let parties = handler
        .list(query.party_type.as_deref(), query.search, &context)
        .await?;

    Ok(Json(json!({ "parties": parties })))
}

// =========================================================================
// POST /parties
// =========================================================================

async fn create_party(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Json(request): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let handler = PartyHandler::new(pool);

    let mut command = CreatePartyCommand::new(request.name, request.phone, request.party_type);
    if let Some(gst) = request.gst {
        command = command.with_gst(gst);
    }
    if let Some(address) = request.address {
        command = command.with_address(address);
    }

    let party = handler.create(command, &context).await?;

    Ok((StatusCode::CREATED, Json(json!({ "party": party }))))
}

// =========================================================================
// PUT /parties/:party_id
// =========================================================================

async fn update_party(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(party_id): Path<Uuid>,
    Json(request): Json<UpdatePartyRequest>,
) -> Result<Json<Value>, AppError> {
    let handler = PartyHandler::new(pool);
    let command = UpdatePartyCommand {
        name: request.name,
        phone: request.phone,
        party_type: request.party_type,
        gst: request.gst,
        address: request.address,
    };

    let party = handler.update(party_id, command, &context).await?;

    Ok(Json(json!({ "party": party })))
}

// =========================================================================
// DELETE /parties/:party_id
// =========================================================================

async fn delete_party(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(party_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handler = PartyHandler::new(pool);
    handler.delete(party_id, &context).await?;

    Ok(StatusCode::NO_CONTENT)
}
