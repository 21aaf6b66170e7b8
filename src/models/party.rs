//! Party model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::PartyType;

/// A row of `parties`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Party {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub phone: String,
    pub party_type: String,
    pub gst: Option<String>,
    pub address: Option<String>,
    /// Running total of live invoices billed to this party
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a party.
#[derive(Debug, Clone)]
pub struct NewParty {
    pub name: String,
    pub phone: String,
    pub party_type: PartyType,
    pub gst: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a party. Balance only moves with invoices.
#[derive(Debug, Clone, Default)]
pub struct PartyChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub party_type: Option<PartyType>,
    pub gst: Option<String>,
    pub address: Option<String>,
}
