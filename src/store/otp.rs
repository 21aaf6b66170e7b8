//! OTP Repository
//!
//! One pending code per phone. Only the sha256 of the code is stored.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::StoreError;

/// A row of `otp_codes`.
#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub phone: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Repository for `otp_codes`
#[derive(Debug, Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a code for `phone`, replacing any pending one.
    pub async fn upsert(
        &self,
        phone: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (phone, code_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone) DO UPDATE
            SET code_hash = EXCLUDED.code_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            "#,
        )
        .bind(phone)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find(&self, phone: &str) -> Result<Option<OtpRecord>, StoreError> {
        let record = sqlx::query_as::<_, OtpRecord>(
            "SELECT phone, code_hash, expires_at, created_at FROM otp_codes WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn delete(&self, phone: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM otp_codes WHERE phone = $1")
            .bind(phone)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete the pending code only if it still has `code_hash`.
    /// Returns `false` when another request consumed or replaced it first.
    pub async fn consume(&self, phone: &str, code_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE phone = $1 AND code_hash = $2")
            .bind(phone)
            .bind(code_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every code that expired before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
