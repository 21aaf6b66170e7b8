//! Items, parties and OTP integration tests
//!
//! Run with: cargo test --features integration_tests

#![cfg(feature = "integration_tests")]

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use siisa_billing::auth::{hash_code, TokenService};
use siisa_billing::domain::{CallerContext, DomainError, LineRequest, Role};
use siisa_billing::handlers::{
    AuthHandler, CreateInvoiceCommand, CreateInvoiceHandler, CreatePartyCommand, ItemHandler,
    ItemRows, PartyHandler, UpdatePartyCommand,
};
use siisa_billing::jobs::purge_expired_otps;
use siisa_billing::models::{Item, ItemChanges};
use siisa_billing::state::OtpSettings;
use siisa_billing::store::{ItemListQuery, ItemSort, OtpRepository, SortOrder};
use siisa_billing::AppError;

mod common;

fn owned(rows: ItemRows) -> Vec<Item> {
    match rows {
        ItemRows::Owned(items) => items,
        ItemRows::Catalog(_) => panic!("Expected owner rows for an admin"),
    }
}

// =========================================================================
// Items
// =========================================================================

#[tokio::test]
async fn test_item_listing_pages_and_sorts_within_owner() {
    let pool = common::setup_test_db().await;
    let admin = common::seed_admin(&pool).await;
    let other = common::seed_admin(&pool).await;
    let ctx = common::admin_context(&admin);

    common::seed_item(&pool, admin.id, "Blue Widget", dec!(30), dec!(1)).await;
    common::seed_item(&pool, admin.id, "Red Widget", dec!(10), dec!(1)).await;
    common::seed_item(&pool, admin.id, "Green Gadget", dec!(20), dec!(1)).await;
    common::seed_item(&pool, other.id, "Other Widget", dec!(1), dec!(1)).await;

    let handler = ItemHandler::new(pool.clone());

    // A forged owner id is replaced by the caller's own
    let query = ItemListQuery::new(Some(other.id), Some(1), Some(2))
        .with_sort(ItemSort::UnitPrice, SortOrder::Asc);
    let first = handler.list(query, &ctx).await.unwrap();

    assert_eq!(first.total, 3);
    assert_eq!(first.total_pages, 2);
    let names: Vec<String> = owned(first.items).into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Red Widget", "Green Gadget"]);

    let query = ItemListQuery::new(None, Some(2), Some(2))
        .with_sort(ItemSort::UnitPrice, SortOrder::Asc);
    let second = handler.list(query, &ctx).await.unwrap();
    let names: Vec<String> = owned(second.items).into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Blue Widget"]);

    let query = ItemListQuery::new(None, None, None)
        .with_search(Some("widget".to_string()))
        .with_sort(ItemSort::Name, SortOrder::Desc);
    let found = handler.list(query, &ctx).await.unwrap();
    assert_eq!(found.total, 2);
    let names: Vec<String> = owned(found.items).into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Red Widget", "Blue Widget"]);
}

#[tokio::test]
async fn test_item_update_changes_only_given_fields() {
    let pool = common::setup_test_db().await;
    let admin = common::seed_admin(&pool).await;
    let ctx = common::admin_context(&admin);
    let item = common::seed_item(&pool, admin.id, "Ink Bottle", dec!(40), dec!(12)).await;
    let handler = ItemHandler::new(pool.clone());

    let changes = ItemChanges {
        unit_price: Some(dec!(42.125)),
        stock: Some(dec!(7)),
        ..Default::default()
    };
    let updated = handler.update(item.id, changes, &ctx).await.unwrap();

    assert_eq!(updated.name, "Ink Bottle");
    assert_eq!(updated.unit_price, dec!(42.125));
    assert_eq!(updated.stock, dec!(7));
    assert_eq!(updated.cgst, dec!(9));

    let err = handler
        .update(
            item.id,
            ItemChanges {
                cgst: Some(dec!(-1)),
                ..Default::default()
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::InvalidValue(_))));

    let err = handler
        .update(Uuid::new_v4(), ItemChanges::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ItemNotFound(_)));

    let customer = CallerContext::new(Uuid::new_v4(), Role::Customer);
    let err = handler
        .update(item.id, ItemChanges::default(), &customer)
        .await
        .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
}

// =========================================================================
// Parties
// =========================================================================

#[tokio::test]
async fn test_party_listing_filters_by_type_and_search() {
    let pool = common::setup_test_db().await;
    let admin = common::seed_admin(&pool).await;
    let ctx = common::admin_context(&admin);
    let handler = PartyHandler::new(pool.clone());

    let kumar = CreatePartyCommand::new(
        "Kumar Traders".to_string(),
        "080-5550-1111".to_string(),
        "supplier".to_string(),
    );
    handler.create(kumar, &ctx).await.unwrap();
    let mehta = CreatePartyCommand::new(
        "Mehta Stores".to_string(),
        "080-5550-2222".to_string(),
        "CUSTOMER".to_string(),
    );
    handler.create(mehta, &ctx).await.unwrap();
    let rao = CreatePartyCommand::new(
        "Rao & Sons".to_string(),
        "044-7770-3333".to_string(),
        "Customer".to_string(),
    );
    handler.create(rao, &ctx).await.unwrap();

    let all = handler.list(None, None, &ctx).await.unwrap();
    assert_eq!(all.len(), 3);

    let suppliers = handler.list(Some("supplier"), None, &ctx).await.unwrap();
    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].name, "Kumar Traders");
    assert_eq!(suppliers[0].party_type, "SUPPLIER");

    let customers = handler.list(Some("CUSTOMER"), None, &ctx).await.unwrap();
    assert_eq!(customers.len(), 2);

    let by_name = handler
        .list(None, Some("mehta".to_string()), &ctx)
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Mehta Stores");

    let by_phone = handler
        .list(None, Some("5550".to_string()), &ctx)
        .await
        .unwrap();
    assert_eq!(by_phone.len(), 2);

    let customer_by_phone = handler
        .list(Some("customer"), Some("5550".to_string()), &ctx)
        .await
        .unwrap();
    assert_eq!(customer_by_phone.len(), 1);

    let err = handler.list(Some("vendor"), None, &ctx).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_party_update_keeps_balance() {
    let pool = common::setup_test_db().await;
    let admin = common::seed_admin(&pool).await;
    let ctx = common::admin_context(&admin);
    let item = common::seed_item(&pool, admin.id, "Paint", dec!(100), dec!(5)).await;
    let party = common::seed_party(&pool, admin.id, "Colour House").await;

    CreateInvoiceHandler::new(pool.clone())
        .execute(
            CreateInvoiceCommand::new(party.id, vec![LineRequest::new(item.id, dec!(1))]),
            &ctx,
        )
        .await
        .unwrap();

    let command = UpdatePartyCommand {
        name: Some("  Colour House Pvt Ltd ".to_string()),
        party_type: Some("supplier".to_string()),
        gst: Some("29abcde1234f1z5".to_string()),
        ..Default::default()
    };
    let updated = PartyHandler::new(pool.clone())
        .update(party.id, command, &ctx)
        .await
        .unwrap();

    assert_eq!(updated.name, "Colour House Pvt Ltd");
    assert_eq!(updated.party_type, "SUPPLIER");
    assert_eq!(updated.gst.as_deref(), Some("29ABCDE1234F1Z5"));
    assert_eq!(updated.phone, party.phone);
    assert_eq!(updated.balance, dec!(118.00));

    let err = PartyHandler::new(pool.clone())
        .update(Uuid::new_v4(), UpdatePartyCommand::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PartyNotFound(_)));
}

// =========================================================================
// OTP
// =========================================================================

fn auth_handler(pool: sqlx::PgPool) -> AuthHandler {
    AuthHandler::new(
        pool,
        TokenService::new(common::TEST_JWT_SECRET, 60),
        OtpSettings {
            ttl: Duration::seconds(120),
            expose_in_response: true,
        },
    )
}

#[tokio::test]
async fn test_expired_otp_is_rejected_and_discarded() {
    let pool = common::setup_test_db().await;
    let handler = auth_handler(pool.clone());
    let otps = OtpRepository::new(pool.clone());

    let issued = handler.request_otp(&common::unique_phone()).await.unwrap();
    let code = issued.otp.clone().unwrap();

    // Same code, but already past its expiry
    otps.upsert(
        &issued.phone,
        &hash_code(&issued.phone, &code),
        Utc::now() - Duration::seconds(1),
    )
    .await
    .unwrap();

    let err = handler.verify_otp(&issued.phone, &code).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));
    assert!(otps.find(&issued.phone).await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_removes_expired_codes_only() {
    let pool = common::setup_test_db().await;
    let otps = OtpRepository::new(pool.clone());
    let expired = common::unique_phone();
    let pending = common::unique_phone();

    otps.upsert(&expired, "stale", Utc::now() - Duration::minutes(5))
        .await
        .unwrap();
    otps.upsert(&pending, "fresh", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    purge_expired_otps(&pool).await.unwrap();

    assert!(otps.find(&expired).await.unwrap().is_none());
    assert!(otps.find(&pending).await.unwrap().is_some());
}
