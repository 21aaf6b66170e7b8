//! Item Handler
//!
//! Inventory management for admins and catalog browsing for customers.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CallerContext, Money, Percent, Quantity};
use crate::error::AppError;
use crate::models::{CatalogItem, Item, ItemChanges, NewItem};
use crate::store::{ItemListQuery, ItemRepository};

use super::CreateItemCommand;

/// Rows of a listing; customers never see cost price or owner.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ItemRows {
    Owned(Vec<Item>),
    Catalog(Vec<CatalogItem>),
}

impl ItemRows {
    pub fn len(&self) -> usize {
        match self {
            ItemRows::Owned(rows) => rows.len(),
            ItemRows::Catalog(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct ItemListResult {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub items: ItemRows,
}

/// Handler for item operations
pub struct ItemHandler {
    items: ItemRepository,
}

impl ItemHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool),
        }
    }

    /// List items. `query.owner_id` is overwritten from the caller.
    pub async fn list(
        &self,
        query: ItemListQuery,
        context: &CallerContext,
    ) -> Result<ItemListResult, AppError> {
        let query = ItemListQuery {
            owner_id: context.is_admin().then(|| context.owner_id()),
            ..query
        };
        let page = self.items.list(&query).await?;

        let items = if context.is_admin() {
            ItemRows::Owned(page.items)
        } else {
            ItemRows::Catalog(page.items.into_iter().map(CatalogItem::from).collect())
        };

        Ok(ItemListResult {
            page: query.page,
            limit: query.limit,
            total: page.total,
            total_pages: total_pages(page.total, query.limit),
            items,
        })
    }

    pub async fn create(
        &self,
        command: CreateItemCommand,
        context: &CallerContext,
    ) -> Result<Item, AppError> {
        context.require_admin()?;

        let name = required_text("name", &command.name)?;
        let item = NewItem {
            name,
            unit_price: Money::positive("unit_price", command.unit_price)?.value(),
            cost_price: command
                .cost_price
                .map(|cost| Money::new("cost_price", cost).map(|m| m.value()))
                .transpose()?,
            stock: Quantity::new(command.stock)?.value(),
            cgst: Percent::new("cgst", command.cgst)?.value(),
            sgst: Percent::new("sgst", command.sgst)?.value(),
            hsn_code: optional_text(command.hsn_code),
            sku: optional_text(command.sku),
            description: optional_text(command.description),
        };

        let created = self.items.create(context.owner_id(), &item).await?;

        tracing::info!(
            item_id = %created.id,
            name = %created.name,
            unit_price = %created.unit_price,
            correlation_id = ?context.correlation_id,
            "Item created"
        );

        Ok(created)
    }

    /// Partial update; absent fields keep their stored value.
    pub async fn update(
        &self,
        item_id: Uuid,
        changes: ItemChanges,
        context: &CallerContext,
    ) -> Result<Item, AppError> {
        context.require_admin()?;

        let changes = ItemChanges {
            name: changes
                .name
                .map(|name| required_text("name", &name))
                .transpose()?,
            unit_price: checked(changes.unit_price, |v| Money::positive("unit_price", v).map(|m| m.value()))?,
            cost_price: checked(changes.cost_price, |v| Money::new("cost_price", v).map(|m| m.value()))?,
            stock: checked(changes.stock, |v| Quantity::new(v).map(|q| q.value()))?,
            cgst: checked(changes.cgst, |v| Percent::new("cgst", v).map(|p| p.value()))?,
            sgst: checked(changes.sgst, |v| Percent::new("sgst", v).map(|p| p.value()))?,
            hsn_code: changes.hsn_code.map(|s| s.trim().to_string()),
            sku: changes.sku.map(|s| s.trim().to_string()),
            description: changes.description,
        };

        let updated = self
            .items
            .update(context.owner_id(), item_id, &changes)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(item_id.to_string()))?;

        tracing::info!(
            item_id = %updated.id,
            correlation_id = ?context.correlation_id,
            "Item updated"
        );

        Ok(updated)
    }

    pub async fn delete(&self, item_id: Uuid, context: &CallerContext) -> Result<(), AppError> {
        context.require_admin()?;

        if !self.items.delete(context.owner_id(), item_id).await? {
            return Err(AppError::ItemNotFound(item_id.to_string()));
        }

        tracing::info!(
            item_id = %item_id,
            correlation_id = ?context.correlation_id,
            "Item deleted"
        );

        Ok(())
    }
}

fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

fn checked<F, E>(value: Option<Decimal>, check: F) -> Result<Option<Decimal>, AppError>
where
    F: FnOnce(Decimal) -> Result<Decimal, E>,
    AppError: From<E>,
{
    Ok(value.map(check).transpose()?)
}

pub(crate) fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Blank strings are stored as NULL
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
