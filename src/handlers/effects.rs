//! Applies invoice side effects inside the caller's transaction

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::InvoiceEffects;
use crate::store::{ItemRepository, PartyRepository, StoreError};

/// Write every stock and balance movement. Stock rows are touched in item id
/// order, then party rows.
pub(crate) async fn apply_effects(
    items: &ItemRepository,
    parties: &PartyRepository,
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
    effects: &InvoiceEffects,
) -> Result<(), StoreError> {
    for movement in &effects.stock {
        items.adjust_stock(tx, owner_id, movement).await?;
    }
    for movement in &effects.balances {
        parties.adjust_balance(tx, owner_id, movement).await?;
    }
    Ok(())
}
