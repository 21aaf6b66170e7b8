//! Invoice Repository

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::PricedLine;
use crate::models::{Invoice, InvoiceDetail, InvoiceLine, InvoiceLineDetail, Party};

use super::parties::PARTY_COLUMNS;
use super::StoreError;

const INVOICE_COLUMNS: &str = "id, owner_id, party_id, invoice_no, total, created_at, updated_at";

const LINE_COLUMNS: &str = "id, invoice_id, item_id, line_no, quantity, rate, cgst, sgst, total";

const LINE_DETAIL_SELECT: &str = r#"
    SELECT ii.id, ii.invoice_id, ii.item_id, i.name AS item_name, i.hsn_code,
           ii.line_no, ii.quantity, ii.rate, ii.cgst, ii.sgst, ii.total
    FROM invoice_items ii
    JOIN items i ON i.id = ii.item_id
"#;

/// Repository for `invoices` and `invoice_items`
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The owner's invoices, newest first, with parties and lines.
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<InvoiceDetail>, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM invoices WHERE owner_id = $1 ORDER BY created_at DESC, id DESC",
            INVOICE_COLUMNS
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(owner_id)
            .fetch_all(&mut *conn)
            .await?;

        assemble_details(&mut *conn, invoices).await
    }

    /// One invoice of the owner with its party and lines.
    pub async fn find_detail(
        &self,
        owner_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceDetail>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        find_detail_on(&mut *conn, owner_id, invoice_id).await
    }

    /// Same as [`InvoiceRepository::find_detail`], but sees the uncommitted
    /// writes of `tx`.
    pub async fn find_detail_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceDetail>, StoreError> {
        find_detail_on(&mut **tx, owner_id, invoice_id).await
    }

    // =========================================================================
    // Writes (transactional)
    // =========================================================================

    /// Number of the owner's most recent invoice.
    pub async fn last_invoice_no(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
    ) -> Result<Option<String>, StoreError> {
        let last: Option<String> = sqlx::query_scalar(
            r#"
            SELECT invoice_no
            FROM invoices
            WHERE owner_id = $1
            ORDER BY created_at DESC, length(invoice_no) DESC, invoice_no DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(last)
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        party_id: Uuid,
        invoice_no: &str,
        total: Decimal,
    ) -> Result<Invoice, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO invoices (owner_id, party_id, invoice_no, total)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(owner_id)
            .bind(party_id)
            .bind(invoice_no)
            .bind(total)
            .fetch_one(&mut **tx)
            .await?;

        Ok(invoice)
    }

    /// Insert `lines` in order, numbering them from 1.
    pub async fn insert_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<Vec<InvoiceLine>, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO invoice_items
                (invoice_id, item_id, line_no, quantity, rate, cgst, sgst, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            LINE_COLUMNS
        );

        let mut inserted = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let line_no = (index + 1) as i32;

            let row = sqlx::query_as::<_, InvoiceLine>(&sql)
                .bind(invoice_id)
                .bind(line.item_id)
                .bind(line_no)
                .bind(line.quantity)
                .bind(line.rate)
                .bind(line.cgst)
                .bind(line.sgst)
                .bind(line.total)
                .fetch_one(&mut **tx)
                .await?;
            inserted.push(row);
        }

        Ok(inserted)
    }

    /// Fetch an owned invoice and lock its row until the transaction ends.
    pub async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, StoreError> {
        let sql = format!(
            "SELECT {} FROM invoices WHERE id = $1 AND owner_id = $2 FOR UPDATE",
            INVOICE_COLUMNS
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .bind(owner_id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(invoice)
    }

    pub async fn lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceLine>, StoreError> {
        let sql = format!(
            "SELECT {} FROM invoice_items WHERE invoice_id = $1 ORDER BY line_no",
            LINE_COLUMNS
        );
        let lines = sqlx::query_as::<_, InvoiceLine>(&sql)
            .bind(invoice_id)
            .fetch_all(&mut **tx)
            .await?;

        Ok(lines)
    }

    /// Point the invoice at `party_id` with a new total. The number is kept.
    pub async fn update_header(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
        party_id: Uuid,
        total: Decimal,
    ) -> Result<Invoice, StoreError> {
        let sql = format!(
            r#"
            UPDATE invoices
            SET party_id = $2, total = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .bind(party_id)
            .bind(total)
            .fetch_optional(&mut **tx)
            .await?;

        invoice.ok_or(StoreError::RowMissing {
            table: "invoices",
            id: invoice_id,
        })
    }

    pub async fn delete_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invoice_id: Uuid,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::RowMissing {
                table: "invoices",
                id: invoice_id,
            });
        }
        Ok(())
    }
}

async fn find_detail_on(
    conn: &mut PgConnection,
    owner_id: Uuid,
    invoice_id: Uuid,
) -> Result<Option<InvoiceDetail>, StoreError> {
    let sql = format!(
        "SELECT {} FROM invoices WHERE id = $1 AND owner_id = $2",
        INVOICE_COLUMNS
    );
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(invoice_id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;

    match invoice {
        Some(invoice) => Ok(assemble_details(conn, vec![invoice]).await?.pop()),
        None => Ok(None),
    }
}

/// Attach parties and lines to `invoices` with one query each.
async fn assemble_details(
    conn: &mut PgConnection,
    invoices: Vec<Invoice>,
) -> Result<Vec<InvoiceDetail>, StoreError> {
    if invoices.is_empty() {
        return Ok(Vec::new());
    }

    let invoice_ids: Vec<Uuid> = invoices.iter().map(|i| i.id).collect();
    let party_ids: Vec<Uuid> = invoices.iter().map(|i| i.party_id).collect();

    let parties = sqlx::query_as::<_, Party>(&format!(
        "SELECT {} FROM parties WHERE id = ANY($1)",
        PARTY_COLUMNS
    ))
    .bind(&party_ids)
    .fetch_all(&mut *conn)
    .await?;
    let parties: HashMap<Uuid, Party> = parties.into_iter().map(|p| (p.id, p)).collect();

    let lines = sqlx::query_as::<_, InvoiceLineDetail>(&format!(
        "{} WHERE ii.invoice_id = ANY($1) ORDER BY ii.invoice_id, ii.line_no",
        LINE_DETAIL_SELECT
    ))
    .bind(&invoice_ids)
    .fetch_all(&mut *conn)
    .await?;
    let mut lines_by_invoice: HashMap<Uuid, Vec<InvoiceLineDetail>> = HashMap::new();
    for line in lines {
        lines_by_invoice.entry(line.invoice_id).or_default().push(line);
    }

    invoices
        .into_iter()
        .map(|invoice| {
            // Several invoices may share a party, so clone rather than remove
            let party = parties
                .get(&invoice.party_id)
                .cloned()
                .ok_or(StoreError::RowMissing {
                    table: "parties",
                    id: invoice.party_id,
                })?;
            let lines = lines_by_invoice.remove(&invoice.id).unwrap_or_default();
            Ok(InvoiceDetail {
                invoice,
                party,
                lines,
            })
        })
        .collect()
}
