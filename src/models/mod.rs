//! Row models
//!
//! Database rows and the write inputs for each table.

mod invoice;
mod item;
mod party;
mod user;

pub use invoice::{Invoice, InvoiceDetail, InvoiceLine, InvoiceLineDetail};
pub use item::{CatalogItem, Item, ItemChanges, NewItem};
pub use party::{NewParty, Party, PartyChanges};
pub use user::{User, UserSummary};
