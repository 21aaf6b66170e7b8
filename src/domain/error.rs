//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;
use uuid::Uuid;

use super::values::ValueError;

/// Business rule violations raised by the billing core.
///
/// These are independent of the web/infrastructure layer; `AppError` decides
/// how each one is presented to a client.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A quantity, price or tax percentage failed validation
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] ValueError),

    /// Invoice created without any lines
    #[error("Invoice must contain at least one line")]
    EmptyInvoice,

    /// Requested items that do not exist for this owner
    #[error("One or more items invalid: {missing:?}")]
    UnknownItems { missing: Vec<Uuid> },

    /// Party missing or owned by someone else
    #[error("Invalid party: {0}")]
    InvalidParty(Uuid),

    /// Stored invoice number could not be incremented
    #[error("Invalid invoice number: {0}")]
    InvalidInvoiceNumber(String),

    /// Caller lacks the role required for the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),
}

impl DomainError {
    /// Create an unknown-items error with a deterministic id order
    pub fn unknown_items(mut missing: Vec<Uuid>) -> Self {
        missing.sort();
        missing.dedup();
        Self::UnknownItems { missing }
    }
}
