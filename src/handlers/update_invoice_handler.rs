//! Update Invoice Handler
//!
//! Replaces an invoice's party and lines and moves stock and balances by the
//! difference between the old and new invoice.

use sqlx::PgPool;

use crate::domain::{
    price_lines, unique_item_ids, CallerContext, DomainError, InvoiceEffects, InvoiceSnapshot,
};
use crate::error::AppError;
use crate::models::InvoiceDetail;
use crate::store::{InvoiceRepository, ItemRepository, PartyRepository};

use super::effects::apply_effects;
use super::UpdateInvoiceCommand;

/// Handler for invoice updates
pub struct UpdateInvoiceHandler {
    pool: PgPool,
    items: ItemRepository,
    parties: PartyRepository,
    invoices: InvoiceRepository,
}

impl UpdateInvoiceHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool.clone()),
            parties: PartyRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Execute the update command
    pub async fn execute(
        &self,
        command: UpdateInvoiceCommand,
        context: &CallerContext,
    ) -> Result<InvoiceDetail, AppError> {
        context.require_admin()?;

        let owner_id = context.owner_id();
        let mut tx = self.pool.begin().await?;

        let invoice = self
            .invoices
            .lock(&mut tx, owner_id, command.invoice_id)
            .await?
            .ok_or_else(|| AppError::InvoiceNotFound(command.invoice_id.to_string()))?;
        let old_lines = self.invoices.lines(&mut tx, invoice.id).await?;
        let previous = invoice.snapshot(&old_lines);

        if !self.parties.is_owned(&mut tx, owner_id, command.party_id).await? {
            return Err(DomainError::InvalidParty(command.party_id).into());
        }

        let item_ids = unique_item_ids(&command.lines);
        let catalog = self.items.catalog_prices(&mut tx, owner_id, &item_ids).await?;
        let lines = price_lines(&command.lines, &catalog)?;
        let next = InvoiceSnapshot::from_lines(command.party_id, &lines)?;

        self.invoices.delete_lines(&mut tx, invoice.id).await?;
        self.invoices.insert_lines(&mut tx, invoice.id, &lines).await?;
        self.invoices
            .update_header(&mut tx, invoice.id, command.party_id, next.total)
            .await?;

        let effects = InvoiceEffects::between(Some(&previous), Some(&next));
        apply_effects(&self.items, &self.parties, &mut tx, owner_id, &effects).await?;

        let detail = self
            .invoices
            .find_detail_in(&mut tx, owner_id, invoice.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("invoice {} vanished", invoice.id)))?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            invoice_no = %invoice.invoice_no,
            previous_total = %previous.total,
            total = %next.total,
            stock_movements = effects.stock.len(),
            balance_movements = effects.balances.len(),
            correlation_id = ?context.correlation_id,
            "Invoice updated"
        );

        Ok(detail)
    }
}
