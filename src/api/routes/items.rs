//! Item endpoints

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::CallerContext;
use crate::error::AppError;
use crate::handlers::{CreateItemCommand, ItemHandler, ItemListResult};
use crate::models::ItemChanges;
use crate::state::AppState;
use crate::store::{ItemListQuery, ItemSort, SortOrder};

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl ItemsQuery {
    fn into_list_query(self) -> ItemListQuery {
        ItemListQuery::new(None, self.page, self.limit)
            .with_search(self.search)
            .with_sort(
                ItemSort::parse(self.sort.as_deref()),
                SortOrder::parse(self.order.as_deref()),
            )
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "unitPrice")]
    pub unit_price: Option<Decimal>,
    #[serde(default, alias = "costPrice")]
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<Decimal>,
    #[serde(default)]
    pub cgst: Option<Decimal>,
    #[serde(default)]
    pub sgst: Option<Decimal>,
    #[serde(default, alias = "hsnCode")]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "unitPrice")]
    pub unit_price: Option<Decimal>,
    #[serde(default, alias = "costPrice")]
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<Decimal>,
    #[serde(default)]
    pub cgst: Option<Decimal>,
    #[serde(default)]
    pub sgst: Option<Decimal>,
    #[serde(default, alias = "hsnCode")]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<UpdateItemRequest> for ItemChanges {
    fn from(request: UpdateItemRequest) -> Self {
        Self {
            name: request.name,
            unit_price: request.unit_price,
            cost_price: request.cost_price,
            stock: request.stock,
            cgst: request.cgst,
            sgst: request.sgst,
            hsn_code: request.hsn_code,
            sku: request.sku,
            description: request.description,
        }
    }
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:item_id", put(update_item).delete(delete_item))
}

// =========================================================================
// GET /items
// =========================================================================

async fn list_items(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<ItemListResult>, AppError> {
    let handler = ItemHandler::new(pool);
    Ok(Json(handler.list(query.into_list_query(), &context).await?))
}

// =========================================================================
// POST /items
// =========================================================================

async fn create_item(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let handler = ItemHandler::new(pool);

    let unit_price = request
        .unit_price
        .ok_or_else(|| AppError::InvalidRequest("unit_price is required".to_string()))?;

    let mut command = CreateItemCommand::new(request.name, unit_price)
        .with_stock(request.stock.unwrap_or(Decimal::ZERO))
        .with_taxes(
            request.cgst.unwrap_or(Decimal::ZERO),
            request.sgst.unwrap_or(Decimal::ZERO),
        );
    if let Some(cost_price) = request.cost_price {
        command = command.with_cost_price(cost_price);
    }
    command.hsn_code = request.hsn_code;
    command.sku = request.sku;
    command.description = request.description;

    let item = handler.create(command, &context).await?;

    Ok((StatusCode::CREATED, Json(json!({ "item": item }))))
}

// =========================================================================
// PUT /items/:item_id
// =========================================================================

async fn update_item(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<Value>, AppError> {
    let handler = ItemHandler::new(pool);
    let item = handler.update(item_id, request.into(), &context).await?;

    Ok(Json(json!({ "item": item })))
}

// =========================================================================
// DELETE /items/:item_id
// =========================================================================

async fn delete_item(
    State(pool): State<PgPool>,
    Extension(context): Extension<CallerContext>,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handler = ItemHandler::new(pool);
    handler.delete(item_id, &context).await?;

    Ok(StatusCode::NO_CONTENT)
}
