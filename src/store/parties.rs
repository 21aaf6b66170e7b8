//! Party Repository

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{BalanceMovement, PartyType};
use crate::models::{NewParty, Party, PartyChanges};

use super::{search_term, StoreError};

pub(crate) const PARTY_COLUMNS: &str =
    "id, owner_id, name, phone, party_type, gst, address, balance, created_at, updated_at";

/// Filters for a party listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyListQuery {
    pub party_type: Option<PartyType>,
    /// Case-insensitive match on name or phone
    pub search: Option<String>,
}

/// Repository for `parties`
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: PgPool,
}

impl PartyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, party: &NewParty) -> Result<Party, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO parties (owner_id, name, phone, party_type, gst, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PARTY_COLUMNS
        );

        let created = sqlx::query_as::<_, Party>(&sql)
            .bind(owner_id)
            .bind(&party.name)
            .bind(&party.phone)
            .bind(party.party_type.as_str())
            .bind(&party.gst)
            .bind(&party.address)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    pub async fn list(&self, owner_id: Uuid, query: &PartyListQuery) -> Result<Vec<Party>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM parties
            WHERE owner_id = $1
              AND ($2::text IS NULL OR party_type = $2)
              AND ($3::text IS NULL OR name ILIKE $3 ESCAPE '\' OR phone ILIKE $3 ESCAPE '\')
            ORDER BY updated_at DESC, id DESC
            "#,
            PARTY_COLUMNS
        );

        let parties = sqlx::query_as::<_, Party>(&sql)
            .bind(owner_id)
            .bind(query.party_type.map(|t| t.as_str()))
            .bind(search_term(query.search.as_deref()))
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    pub async fn find(&self, owner_id: Uuid, party_id: Uuid) -> Result<Option<Party>, StoreError> {
        let sql = format!(
            "SELECT {} FROM parties WHERE id = $1 AND owner_id = $2",
            PARTY_COLUMNS
        );
        let party = sqlx::query_as::<_, Party>(&sql)
            .bind(party_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(party)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        party_id: Uuid,
        changes: &PartyChanges,
    ) -> Result<Option<Party>, StoreError> {
        let sql = format!(
            r#"
            UPDATE parties SET
                name = COALESCE($3, name),
                phone = COALESCE($4, phone),
                party_type = COALESCE($5, party_type),
                gst = COALESCE($6, gst),
                address = COALESCE($7, address),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {}
            "#,
            PARTY_COLUMNS
        );

        let party = sqlx::query_as::<_, Party>(&sql)
            .bind(party_id)
            .bind(owner_id)
            .bind(&changes.name)
            .bind(&changes.phone)
            .bind(changes.party_type.map(|t| t.as_str()))
            .bind(&changes.gst)
            .bind(&changes.address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(party)
    }

    /// Parties billed on an invoice fail with [`StoreError::StillReferenced`].
    pub async fn delete(&self, owner_id: Uuid, party_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM parties WHERE id = $1 AND owner_id = $2")
            .bind(party_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Invoice support (transactional)
    // =========================================================================

    pub async fn is_owned(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        party_id: Uuid,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM parties WHERE id = $1 AND owner_id = $2)",
        )
        .bind(party_id)
        .bind(owner_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(exists)
    }

    /// Add `movement.delta` to the party's balance.
    pub async fn adjust_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        movement: &BalanceMovement,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE parties
            SET balance = balance + $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(movement.party_id)
        .bind(owner_id)
        .bind(movement.delta)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::RowMissing {
                table: "parties",
                id: movement.party_id,
            });
        }

        tracing::debug!(party_id = %movement.party_id, delta = %movement.delta, "Balance adjusted");
        Ok(())
    }
}
