// src/bin/seed_catalog.rs
//
// Seeds the demo catalog: the five standard currencies, one product per
// currency, and a fully derived price ledger for each product. Safe to
// run repeatedly; rows that already exist are skipped.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;

use catalog_backend::entities::prelude::*;
use catalog_backend::entities::{currencies, products};
use catalog_backend::services::conversion::round_money;
use catalog_backend::services::pricing::PricingService;
use catalog_backend::store::NewProduct;
use catalog_backend::store::postgres::PostgresStore;

const CURRENCIES: &[(&str, &str, Decimal)] = &[
    ("US Dollar", "$", dec!(1.0)),
    ("Euro", "€", dec!(0.92)),
    ("British Pound", "£", dec!(0.79)),
    ("Mexican Peso", "MX$", dec!(17.5)),
    ("Japanese Yen", "¥", dec!(150.0)),
];

const DEMO_PRODUCTS: &[(&str, &str, Decimal)] = &[
    ("Analog synthesizer", "US Dollar", dec!(1299.00)),
    ("Espresso grinder", "Euro", dec!(250.50)),
    ("Wool overcoat", "British Pound", dec!(189.99)),
    ("Talavera dinner set", "Mexican Peso", dec!(1750.00)),
    ("Mechanical keyboard", "Japanese Yen", dec!(14800.00)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url).await?;

    println!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    println!("Seeding currencies...");
    let mut currency_ids: HashMap<&str, i32> = HashMap::new();
    for &(name, symbol, rate) in CURRENCIES {
        let existing = Currencies::find()
            .filter(currencies::Column::Name.eq(name))
            .one(&db)
            .await?;

        let row = match existing {
            Some(row) => {
                println!("   {} already present, skipping", name);
                row
            }
            None => {
                let row = currencies::ActiveModel {
                    name: Set(name.to_string()),
                    symbol: Set(symbol.to_string()),
                    exchange_rate: Set(rate),
                    ..Default::default()
                }
                .insert(&db)
                .await?;
                println!("   Inserted {} (rate {})", name, rate);
                row
            }
        };
        currency_ids.insert(name, row.id);
    }

    let store = Arc::new(PostgresStore::new(db.clone()));
    let pricing = PricingService::new(store.clone(), store);

    println!("Seeding demo products...");
    let mut created = 0usize;
    let mut derived_rows = 0usize;
    for &(name, currency_name, price) in DEMO_PRODUCTS {
        let existing = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(&db)
            .await?;
        if existing.is_some() {
            println!("   {} already present, skipping", name);
            continue;
        }

        let currency_id = *currency_ids
            .get(currency_name)
            .ok_or_else(|| format!("currency {} was not seeded", currency_name))?;

        let product = pricing
            .create_product(NewProduct {
                name: name.to_string(),
                description: format!("Demo catalog item priced in {}", currency_name),
                price,
                currency_id,
                tax_cost: round_money(price * dec!(0.08)),
                manufacturing_cost: round_money(price * dec!(0.35)),
            })
            .await?;
        created += 1;

        let ledger = pricing.derive_all_prices(&product).await?;
        derived_rows += ledger.len();
        println!("   {} -> {} ledger rows", name, ledger.len());
    }

    println!("\nSeed complete!");
    println!("   Currencies: {}", CURRENCIES.len());
    println!("   Products created: {}", created);
    println!("   Ledger rows written: {}", derived_rows);

    Ok(())
}
