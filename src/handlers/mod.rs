//! Command Handlers module
//!
//! Handlers that orchestrate business operations. The invoice handlers keep
//! line totals, item stock and party balances consistent inside one
//! transaction each.

mod auth_handler;
mod commands;
mod create_invoice_handler;
mod delete_invoice_handler;
mod effects;
mod item_handler;
mod party_handler;
mod update_invoice_handler;


pub use auth_handler::AuthHandler;
pub use commands::*;
pub use create_invoice_handler::CreateInvoiceHandler;
pub use delete_invoice_handler::DeleteInvoiceHandler;
pub use item_handler::{ItemHandler, ItemListResult, ItemRows};
pub use party_handler::PartyHandler;
pub use update_invoice_handler::UpdateInvoiceHandler;
