//! Party Handler
//!
//! Customers and suppliers an admin bills. Balances are owned by the
//! invoice handlers and never written here.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CallerContext, PartyType};
use crate::error::AppError;
use crate::models::{NewParty, Party, PartyChanges};
use crate::store::{PartyListQuery, PartyRepository};

use super::item_handler::{optional_text, required_text};
use super::{CreatePartyCommand, UpdatePartyCommand};

/// Handler for party operations
pub struct PartyHandler {
    parties: PartyRepository,
}

impl PartyHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            parties: PartyRepository::new(pool),
        }
    }

    pub async fn list(
        &self,
        party_type: Option<&str>,
        search: Option<String>,
        context: &CallerContext,
    ) -> Result<Vec<Party>, AppError> {
        let query = PartyListQuery {
            party_type: party_type
                .filter(|t| !t.trim().is_empty())
                .map(parse_party_type)
                .transpose()?,
            search,
        };

        Ok(self.parties.list(context.owner_id(), &query).await?)
    }

    pub async fn create(
        &self,
        command: CreatePartyCommand,
        context: &CallerContext,
    ) -> Result<Party, AppError> {
        context.require_admin()?;

        let party = NewParty {
            name: required_text("name", &command.name)?,
            phone: required_text("phone", &command.phone)?,
            party_type: parse_party_type(&command.party_type)?,
            gst: optional_text(command.gst).map(|gst| gst.to_uppercase()),
            address: optional_text(command.address),
        };

        let created = self.parties.create(context.owner_id(), &party).await?;

        tracing::info!(
            party_id = %created.id,
            party_type = %created.party_type,
            correlation_id = ?context.correlation_id,
            "Party created"
        );

        Ok(created)
    }

    pub async fn update(
        &self,
        party_id: Uuid,
        command: UpdatePartyCommand,
        context: &CallerContext,
    ) -> Result<Party, AppError> {
        context.require_admin()?;

        let changes = PartyChanges {
            name: command
                .name
                .map(|name| required_text("name", &name))
                .transpose()?,
            phone: command
                .phone
                .map(|phone| required_text("phone", &phone))
                .transpose()?,
            party_type: command
                .party_type
                .as_deref()
                .map(parse_party_type)
                .transpose()?,
            gst: command.gst.map(|gst| gst.trim().to_uppercase()),
            address: command.address.map(|address| address.trim().to_string()),
        };

        let updated = self
            .parties
            .update(context.owner_id(), party_id, &changes)
            .await?
            .ok_or_else(|| AppError::PartyNotFound(party_id.to_string()))?;

        tracing::info!(
            party_id = %updated.id,
            correlation_id = ?context.correlation_id,
            "Party updated"
        );

        Ok(updated)
    }

    pub async fn delete(&self, party_id: Uuid, context: &CallerContext) -> Result<(), AppError> {
        context.require_admin()?;

        if !self.parties.delete(context.owner_id(), party_id).await? {
            return Err(AppError::PartyNotFound(party_id.to_string()));
        }

        tracing::info!(
            party_id = %party_id,
            correlation_id = ?context.correlation_id,
            "Party deleted"
        );

        Ok(())
    }
}

/// Case-insensitive `CUSTOMER` / `SUPPLIER`
fn parse_party_type(value: &str) -> Result<PartyType, AppError> {
    value
        .trim()
        .to_uppercase()
        .parse::<PartyType>()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))
}
