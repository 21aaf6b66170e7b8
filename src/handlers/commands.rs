//! Command definitions
//!
//! Commands represent intentions to change the system state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::LineRequest;
use crate::models::UserSummary;

// =========================================================================
// Invoices
// =========================================================================

/// Command to bill a party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceCommand {
    pub party_id: Uuid,
    pub lines: Vec<LineRequest>,
}

impl CreateInvoiceCommand {
    pub fn new(party_id: Uuid, lines: Vec<LineRequest>) -> Self {
        Self { party_id, lines }
    }
}

/// Command to replace an invoice's party and lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInvoiceCommand {
    pub invoice_id: Uuid,
    pub party_id: Uuid,
    /// May be empty, which zeroes the invoice
    pub lines: Vec<LineRequest>,
}

impl UpdateInvoiceCommand {
    pub fn new(invoice_id: Uuid, party_id: Uuid, lines: Vec<LineRequest>) -> Self {
        Self {
            invoice_id,
            party_id,
            lines,
        }
    }
}

/// Result of a successful invoice deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteInvoiceResult {
    pub invoice_id: Uuid,
    pub invoice_no: String,
}

// =========================================================================
// Items
// =========================================================================

/// Command to add an item to the owner's inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemCommand {
    pub name: String,
    pub unit_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub hsn_code: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl CreateItemCommand {
    pub fn new(name: String, unit_price: Decimal) -> Self {
        Self {
            name,
            unit_price,
            cost_price: None,
            stock: Decimal::ZERO,
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            hsn_code: None,
            sku: None,
            description: None,
        }
    }

    pub fn with_stock(mut self, stock: Decimal) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_taxes(mut self, cgst: Decimal, sgst: Decimal) -> Self {
        self.cgst = cgst;
        self.sgst = sgst;
        self
    }

    pub fn with_cost_price(mut self, cost_price: Decimal) -> Self {
        self.cost_price = Some(cost_price);
        self
    }
}

// =========================================================================
// Parties
// =========================================================================

/// Command to register a customer or supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartyCommand {
    pub name: String,
    pub phone: String,
    /// `CUSTOMER` or `SUPPLIER`
    pub party_type: String,
    pub gst: Option<String>,
    pub address: Option<String>,
}

impl CreatePartyCommand {
    pub fn new(name: String, phone: String, party_type: String) -> Self {
        Self {
            name,
            phone,
            party_type,
            gst: None,
            address: None,
        }
    }

    pub fn with_gst(mut self, gst: String) -> Self {
        self.gst = Some(gst);
        self
    }

    pub fn with_address(mut self, address: String) -> Self {
        self.address = Some(address);
        self
    }
}

/// Command to edit a party's contact details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePartyCommand {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub party_type: Option<String>,
    pub gst: Option<String>,
    pub address: Option<String>,
}

// =========================================================================
// Authentication
// =========================================================================

/// Password login for admins
#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginCommand {
    pub phone: String,
    pub password: String,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserSummary,
}

/// A freshly issued login code
#[derive(Debug, Clone, Serialize)]
pub struct OtpIssued {
    pub phone: String,
    pub expires_at: DateTime<Utc>,
    /// Only present when codes are echoed back (no SMS gateway)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}
