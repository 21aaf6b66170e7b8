//! Item model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row of `items`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub hsn_code: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item as shown to customers browsing the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub stock: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub hsn_code: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for CatalogItem {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            unit_price: item.unit_price,
            stock: item.stock,
            cgst: item.cgst,
            sgst: item.sgst,
            hsn_code: item.hsn_code,
            sku: item.sku,
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub unit_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub hsn_code: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

/// Input for updating an item. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock: Option<Decimal>,
    pub cgst: Option<Decimal>,
    pub sgst: Option<Decimal>,
    pub hsn_code: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}
