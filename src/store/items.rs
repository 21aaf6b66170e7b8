//! Item Repository

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{CatalogPrice, StockMovement};
use crate::models::{Item, ItemChanges, NewItem};

use super::{search_term, StoreError};

const ITEM_COLUMNS: &str = "id, owner_id, name, unit_price, cost_price, stock, cgst, sgst, \
                            hsn_code, sku, description, created_at, updated_at";

/// Default page size for item listings
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a client may ask for
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sortable item columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSort {
    Name,
    UnitPrice,
    Stock,
    #[default]
    UpdatedAt,
    CreatedAt,
}

impl ItemSort {
    /// Accepts snake_case or camelCase column names; unknown values fall back
    /// to `updated_at`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("name") => ItemSort::Name,
            Some("unit_price" | "unitPrice") => ItemSort::UnitPrice,
            Some("stock") => ItemSort::Stock,
            Some("created_at" | "createdAt") => ItemSort::CreatedAt,
            _ => ItemSort::UpdatedAt,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            ItemSort::Name => "name",
            ItemSort::UnitPrice => "unit_price",
            ItemSort::Stock => "stock",
            ItemSort::UpdatedAt => "updated_at",
            ItemSort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Unknown values fall back to descending.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Paging, search and ordering for an item listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemListQuery {
    /// `None` lists the whole catalog
    pub owner_id: Option<Uuid>,
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub sort: ItemSort,
    pub order: SortOrder,
}

impl ItemListQuery {
    /// Clamp `page` to >= 1 and `limit` to 1..=100.
    pub fn new(owner_id: Option<Uuid>, page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            owner_id,
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            search: None,
            sort: ItemSort::default(),
            order: SortOrder::default(),
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    pub fn with_sort(mut self, sort: ItemSort, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn order_by(&self) -> String {
        // id breaks ties so pages never overlap
        format!("{} {}, id {}", self.sort.column(), self.order.keyword(), self.order.keyword())
    }
}

/// One page of items plus the unpaged count.
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: i64,
}

/// Repository for `items`
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, item: &NewItem) -> Result<Item, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO items
                (owner_id, name, unit_price, cost_price, stock, cgst, sgst, hsn_code, sku, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        let created = sqlx::query_as::<_, Item>(&sql)
            .bind(owner_id)
            .bind(&item.name)
            .bind(item.unit_price)
            .bind(item.cost_price)
            .bind(item.stock)
            .bind(item.cgst)
            .bind(item.sgst)
            .bind(&item.hsn_code)
            .bind(&item.sku)
            .bind(&item.description)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    pub async fn list(&self, query: &ItemListQuery) -> Result<ItemPage, StoreError> {
        let search = search_term(query.search.as_deref());

        let filter = r#"
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR name ILIKE $2 ESCAPE '\')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM items {}", filter))
            .bind(query.owner_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM items {} ORDER BY {} LIMIT $3 OFFSET $4",
            ITEM_COLUMNS,
            filter,
            query.order_by()
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(query.owner_id)
            .bind(&search)
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(ItemPage { items, total })
    }

    pub async fn find(&self, owner_id: Uuid, item_id: Uuid) -> Result<Option<Item>, StoreError> {
        let sql = format!(
            "SELECT {} FROM items WHERE id = $1 AND owner_id = $2",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Apply the non-`None` fields of `changes`. Returns `None` when the item
    /// does not exist for this owner.
    pub async fn update(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        changes: &ItemChanges,
    ) -> Result<Option<Item>, StoreError> {
        let sql = format!(
            r#"
            UPDATE items SET
                name = COALESCE($3, name),
                unit_price = COALESCE($4, unit_price),
                cost_price = COALESCE($5, cost_price),
                stock = COALESCE($6, stock),
                cgst = COALESCE($7, cgst),
                sgst = COALESCE($8, sgst),
                hsn_code = COALESCE($9, hsn_code),
                sku = COALESCE($10, sku),
                description = COALESCE($11, description),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .bind(owner_id)
            .bind(&changes.name)
            .bind(changes.unit_price)
            .bind(changes.cost_price)
            .bind(changes.stock)
            .bind(changes.cgst)
            .bind(changes.sgst)
            .bind(&changes.hsn_code)
            .bind(&changes.sku)
            .bind(&changes.description)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Returns `false` when nothing was deleted. Items still on an invoice
    /// fail with [`StoreError::StillReferenced`].
    pub async fn delete(&self, owner_id: Uuid, item_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND owner_id = $2")
            .bind(item_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Invoice support (transactional)
    // =========================================================================

    /// Catalog prices for the given ids that belong to `owner_id`.
    /// Ids that are missing or foreign are simply absent from the map.
    pub async fn catalog_prices(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        item_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, CatalogPrice>, StoreError> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, Decimal, Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT id, unit_price, cgst, sgst
            FROM items
            WHERE owner_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(owner_id)
        .bind(item_ids)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(item_id, unit_price, cgst, sgst)| {
                (
                    item_id,
                    CatalogPrice {
                        item_id,
                        unit_price,
                        cgst,
                        sgst,
                    },
                )
            })
            .collect())
    }

    /// Add `movement.delta` to the item's stock.
    pub async fn adjust_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        movement: &StockMovement,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE items
            SET stock = stock + $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(movement.item_id)
        .bind(owner_id)
        .bind(movement.delta)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::RowMissing {
                table: "items",
                id: movement.item_id,
            });
        }

        tracing::debug!(item_id = %movement.item_id, delta = %movement.delta, "Stock adjusted");
        Ok(())
    }
}
