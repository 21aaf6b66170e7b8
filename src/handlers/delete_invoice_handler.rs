//! Delete Invoice Handler
//!
//! Puts the invoice's quantities back into stock, reverses the party charge
//! and removes the invoice.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CallerContext, InvoiceEffects};
use crate::error::AppError;
use crate::store::{InvoiceRepository, ItemRepository, PartyRepository};

use super::effects::apply_effects;
use super::DeleteInvoiceResult;

/// Handler for invoice deletion
pub struct DeleteInvoiceHandler {
    pool: PgPool,
    items: ItemRepository,
    parties: PartyRepository,
    invoices: InvoiceRepository,
}

impl DeleteInvoiceHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool.clone()),
            parties: PartyRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn execute(
        &self,
        invoice_id: Uuid,
        context: &CallerContext,
    ) -> Result<DeleteInvoiceResult, AppError> {
        context.require_admin()?;

        let owner_id = context.owner_id();
        let mut tx = self.pool.begin().await?;

        let invoice = self
            .invoices
            .lock(&mut tx, owner_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::InvoiceNotFound(invoice_id.to_string()))?;
        let lines = self.invoices.lines(&mut tx, invoice.id).await?;
        let previous = invoice.snapshot(&lines);

        let effects = InvoiceEffects::between(Some(&previous), None);
        apply_effects(&self.items, &self.parties, &mut tx, owner_id, &effects).await?;

        self.invoices.delete_lines(&mut tx, invoice.id).await?;
        self.invoices.delete(&mut tx, invoice.id).await?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            invoice_no = %invoice.invoice_no,
            party_id = %invoice.party_id,
            total = %invoice.total,
            correlation_id = ?context.correlation_id,
            "Invoice deleted"
        );

        Ok(DeleteInvoiceResult {
            invoice_id: invoice.id,
            invoice_no: invoice.invoice_no,
        })
    }
}
