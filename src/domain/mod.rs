//! Domain module
//!
//! Core billing types and pure invoice logic.

pub mod context;
pub mod error;
pub mod invoice;
pub mod party;
pub mod values;

pub use context::{CallerContext, Role};
pub use error::DomainError;
pub use invoice::{
    invoice_total, next_invoice_no, price_line, price_lines, unique_item_ids, BalanceMovement,
    CatalogPrice, InvoiceEffects, InvoiceSnapshot, LineRequest, PricedLine, StockMovement,
};
pub use party::PartyType;
pub use values::{round_money, Money, Percent, Quantity, ValueError};
