//! Common test utilities
//!
//! Every test works inside its own freshly created admin (tenant), so tests
//! can share one database and run in parallel without truncating tables.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use siisa_billing::auth::{hash_password, TokenService};
use siisa_billing::domain::{CallerContext, PartyType, Role};
use siisa_billing::models::{Item, NewItem, NewParty, Party, User};
use siisa_billing::state::{AppState, OtpSettings};
use siisa_billing::store::{ItemRepository, PartyRepository, UserRepository};

pub const ADMIN_PASSWORD: &str = "correct horse battery";
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Connect to the test database
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB")
}

/// State with a fixed secret and OTP codes echoed back
pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        tokens: TokenService::new(TEST_JWT_SECRET, 60),
        otp: OtpSettings {
            ttl: chrono::Duration::seconds(120),
            expose_in_response: true,
        },
    }
}

/// A phone number no other test uses
pub fn unique_phone() -> String {
    format!("9{:09}", rand::random::<u32>() % 1_000_000_000)
}

/// Insert an admin with [`ADMIN_PASSWORD`]
pub async fn seed_admin(pool: &PgPool) -> User {
    let hash = hash_password(ADMIN_PASSWORD).expect("Failed to hash password");
    UserRepository::new(pool.clone())
        .create_admin(&unique_phone(), Some("Test Admin"), &hash)
        .await
        .expect("Failed to seed admin")
}

pub fn admin_context(admin: &User) -> CallerContext {
    CallerContext::new(admin.id, Role::Admin).with_correlation_id(Uuid::new_v4())
}

pub async fn seed_item(pool: &PgPool, owner_id: Uuid, name: &str, price: Decimal, stock: Decimal) -> Item {
    let item = NewItem {
        name: name.to_string(),
        unit_price: price,
        cost_price: None,
        stock,
        cgst: Decimal::new(9, 0),
        sgst: Decimal::new(9, 0),
        hsn_code: None,
        sku: None,
        description: None,
    };

    ItemRepository::new(pool.clone())
        .create(owner_id, &item)
        .await
        .expect("Failed to seed item")
}

pub async fn seed_party(pool: &PgPool, owner_id: Uuid, name: &str) -> Party {
    let party = NewParty {
        name: name.to_string(),
        phone: unique_phone(),
        party_type: PartyType::Customer,
        gst: None,
        address: None,
    };

    PartyRepository::new(pool.clone())
        .create(owner_id, &party)
        .await
        .expect("Failed to seed party")
}

pub async fn stock_of(pool: &PgPool, owner_id: Uuid, item_id: Uuid) -> Decimal {
    ItemRepository::new(pool.clone())
        .find(owner_id, item_id)
        .await
        .expect("Failed to load item")
        .expect("Item missing")
        .stock
}

pub async fn balance_of(pool: &PgPool, owner_id: Uuid, party_id: Uuid) -> Decimal {
    PartyRepository::new(pool.clone())
        .find(owner_id, party_id)
        .await
        .expect("Failed to load party")
        .expect("Party missing")
        .balance
}
