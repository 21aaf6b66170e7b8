//! Invoice models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::InvoiceSnapshot;

use super::Party;

/// A row of `invoices`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub party_id: Uuid,
    pub invoice_no: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Aggregate-relevant state of this invoice with the given lines.
    pub fn snapshot(&self, lines: &[InvoiceLine]) -> InvoiceSnapshot {
        InvoiceSnapshot::new(
            self.party_id,
            self.total,
            lines.iter().map(|l| (l.item_id, l.quantity)).collect(),
        )
    }
}

/// A row of `invoice_items`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceLine {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub item_id: Uuid,
    pub line_no: i32,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub total: Decimal,
}

/// An invoice line joined with its item's display fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceLineDetail {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub hsn_code: Option<String>,
    pub line_no: i32,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub total: Decimal,
}

/// Invoice with its party and lines, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub party: Party,
    pub lines: Vec<InvoiceLineDetail>,
}
