//! Database module
//!
//! Connection checks and schema verification. The schema itself lives in
//! migrations/ and is applied with sqlx-cli.

use sqlx::PgPool;

use crate::store::UserRepository;

/// Tables the service reads and writes
pub const REQUIRED_TABLES: &[&str] = &[
    "users",
    "otp_codes",
    "items",
    "parties",
    "invoices",
    "invoice_items",
];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for &table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    match UserRepository::new(pool.clone()).admin_exists().await {
        Ok(true) => tracing::info!("Admin account present"),
        Ok(false) => tracing::warn!(
            "No admin account exists. Run the seed_admin binary to create one."
        ),
        Err(e) => tracing::warn!(error = %e, "Could not check for an admin account"),
    }

    Ok(true)
}
