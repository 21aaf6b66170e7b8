//! Create Invoice Handler
//!
//! Prices the requested lines, numbers the invoice, and consumes stock and
//! charges the party in the same transaction.

use sqlx::PgPool;

use crate::domain::{
    next_invoice_no, price_lines, unique_item_ids, CallerContext, DomainError, InvoiceEffects,
    InvoiceSnapshot,
};
use crate::error::AppError;
use crate::models::InvoiceDetail;
use crate::store::{InvoiceRepository, ItemRepository, PartyRepository};

use super::effects::apply_effects;
use super::CreateInvoiceCommand;

/// Handler for invoice creation
pub struct CreateInvoiceHandler {
    pool: PgPool,
    items: ItemRepository,
    parties: PartyRepository,
    invoices: InvoiceRepository,
}

impl CreateInvoiceHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool.clone()),
            parties: PartyRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Execute the create command
    pub async fn execute(
        &self,
        command: CreateInvoiceCommand,
        context: &CallerContext,
    ) -> Result<InvoiceDetail, AppError> {
        context.require_admin()?;
        if command.lines.is_empty() {
            return Err(DomainError::EmptyInvoice.into());
        }

        let owner_id = context.owner_id();
        let mut tx = self.pool.begin().await?;

        if !self.parties.is_owned(&mut tx, owner_id, command.party_id).await? {
            return Err(DomainError::InvalidParty(command.party_id).into());
        }

        let item_ids = unique_item_ids(&command.lines);
        let catalog = self.items.catalog_prices(&mut tx, owner_id, &item_ids).await?;
        let lines = price_lines(&command.lines, &catalog)?;
        let snapshot = InvoiceSnapshot::from_lines(command.party_id, &lines)?;

        let last = self.invoices.last_invoice_no(&mut tx, owner_id).await?;
        let invoice_no = next_invoice_no(last.as_deref())?;

        let invoice = self
            .invoices
            .insert(&mut tx, owner_id, command.party_id, &invoice_no, snapshot.total)
            .await?;
        self.invoices.insert_lines(&mut tx, invoice.id, &lines).await?;

        let effects = InvoiceEffects::between(None, Some(&snapshot));
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
            party_id = %invoice.party_id,
            total = %invoice.total,
            lines = lines.len(),
            correlation_id = ?context.correlation_id,
            "Invoice created"
        );

        Ok(detail)
    }
}
