//! Store module
//!
//! Postgres repositories for users, OTP codes, items, parties and invoices.
//! Methods that take a `Transaction` participate in the caller's unit of work;
//! the rest run straight against the pool.

pub mod invoices;
pub mod items;
pub mod otp;
pub mod parties;
pub mod users;

pub use invoices::InvoiceRepository;
pub use items::{ItemListQuery, ItemPage, ItemRepository, ItemSort, SortOrder};
pub use otp::{OtpRecord, OtpRepository};
pub use parties::{PartyListQuery, PartyRepository};
pub use users::UserRepository;

use uuid::Uuid;

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row is referenced by another table (foreign key violation)
    #[error("Record is still referenced: {0}")]
    StillReferenced(String),

    /// Unique constraint violation
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// A row that must exist inside the current transaction is gone
    #[error("Missing {table} row {id}")]
    RowMissing { table: &'static str, id: Uuid },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::StillReferenced(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Escape `%`, `_` and `\` in user input and wrap it for a substring ILIKE.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed search term, or `None` when there is nothing to search for.
pub(crate) fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern)
}
