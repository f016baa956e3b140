//! Database seeder for Bodega development and testing.
//!
//! Seeds a product catalog, sellable units, payment methods, and a test
//! client/supplier pair for local development.
//!
//! Usage: cargo run --bin seeder

use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::str::FromStr;
use uuid::Uuid;

use bodega_db::entities::{clients, payment_methods, products, suppliers, units};

/// Test product ID (consistent for all seeds)
const TEST_PRODUCT_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Test unit ID (consistent for all seeds)
const TEST_UNIT_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Cash payment method ID
const CASH_METHOD_ID: &str = "00000000-0000-0000-0000-000000000010";
/// Card payment method ID
const CARD_METHOD_ID: &str = "00000000-0000-0000-0000-000000000011";
/// Store credit payment method ID
const CREDIT_METHOD_ID: &str = "00000000-0000-0000-0000-000000000012";
/// Test client ID
const TEST_CLIENT_ID: &str = "00000000-0000-0000-0000-000000000020";
/// Test supplier ID
const TEST_SUPPLIER_ID: &str = "00000000-0000-0000-0000-000000000021";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let db = bodega_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let now = chrono::Utc::now().into();

    let product_id = Uuid::from_str(TEST_PRODUCT_ID).unwrap();
    if products::Entity::find_by_id(product_id)
        .one(&db)
        .await
        .unwrap()
        .is_none()
    {
        products::ActiveModel {
            id: Set(product_id),
            name: Set("House Blend Coffee".to_string()),
            default_cost: Set(Some(dec!(4.50))),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();
        println!("Seeded product {TEST_PRODUCT_ID}");
    }

    let unit_id = Uuid::from_str(TEST_UNIT_ID).unwrap();
    if units::Entity::find_by_id(unit_id)
        .one(&db)
        .await
        .unwrap()
        .is_none()
    {
        units::ActiveModel {
            id: Set(unit_id),
            product_id: Set(product_id),
            name: Set("250g bag".to_string()),
            barcode: Set(Some("7501031311309".to_string())),
            default_cost: Set(Some(dec!(4.75))),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();
        println!("Seeded unit {TEST_UNIT_ID}");
    }

    let methods = [
        (CASH_METHOD_ID, "Cash", false, true, false),
        (CARD_METHOD_ID, "Card", true, false, false),
        (CREDIT_METHOD_ID, "Store credit", false, false, true),
    ];
    for (id, name, requires_reference, affects_cash_ledger, is_credit) in methods {
        let method_id = Uuid::from_str(id).unwrap();
        if payment_methods::Entity::find_by_id(method_id)
            .one(&db)
            .await
            .unwrap()
            .is_none()
        {
            payment_methods::ActiveModel {
                id: Set(method_id),
                name: Set(name.to_string()),
                requires_reference: Set(requires_reference),
                affects_cash_ledger: Set(affects_cash_ledger),
                is_credit: Set(is_credit),
                active: Set(true),
            }
            .insert(&db)
            .await
            .unwrap();
            println!("Seeded payment method {name}");
        }
    }

    let client_id = Uuid::from_str(TEST_CLIENT_ID).unwrap();
    if clients::Entity::find_by_id(client_id)
        .one(&db)
        .await
        .unwrap()
        .is_none()
    {
        clients::ActiveModel {
            id: Set(client_id),
            name: Set("Walk-in Client".to_string()),
            active: Set(true),
        }
        .insert(&db)
        .await
        .unwrap();
        println!("Seeded client {TEST_CLIENT_ID}");
    }

    let supplier_id = Uuid::from_str(TEST_SUPPLIER_ID).unwrap();
    if suppliers::Entity::find_by_id(supplier_id)
        .one(&db)
        .await
        .unwrap()
        .is_none()
    {
        suppliers::ActiveModel {
            id: Set(supplier_id),
            name: Set("Roastery Co.".to_string()),
            active: Set(true),
        }
        .insert(&db)
        .await
        .unwrap();
        println!("Seeded supplier {TEST_SUPPLIER_ID}");
    }

    println!("Seeding complete");
}
