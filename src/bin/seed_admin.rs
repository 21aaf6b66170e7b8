//! Admin Seeder
//!
//! Creates the first admin account when none exists for the phone.
//!
//! Run with: cargo run --bin seed_admin
//! Overrides: SEED_ADMIN_PHONE, SEED_ADMIN_PASSWORD, SEED_ADMIN_NAME

use sqlx::postgres::PgPoolOptions;

use siisa_billing::auth::{hash_password, normalize_phone};
use siisa_billing::store::UserRepository;

const DEFAULT_PHONE: &str = "9999999999";
const DEFAULT_PASSWORD: &str = "admin123";
const DEFAULT_NAME: &str = "SIISA Admin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL")?;
    let raw_phone = std::env::var("SEED_ADMIN_PHONE").unwrap_or_else(|_| DEFAULT_PHONE.to_string());
    let password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());
    let name = std::env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string());

    let phone = normalize_phone(&raw_phone)
        .ok_or_else(|| anyhow::anyhow!("SEED_ADMIN_PHONE is not a valid phone number"))?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;
    let users = UserRepository::new(pool.clone());

    if let Some(existing) = users.find_by_phone(&phone).await? {
        tracing::info!(user_id = %existing.id, role = %existing.role, "User already exists, nothing to do");
        pool.close().await;
        return Ok(());
    }

    let password_hash = hash_password(&password)?;
    let admin = users.create_admin(&phone, Some(&name), &password_hash).await?;

    tracing::info!(user_id = %admin.id, phone = %admin.phone, "Admin created");
    if password == DEFAULT_PASSWORD {
        tracing::warn!("Admin uses the default password; change it before going live");
    }

    pool.close().await;
    Ok(())
}
