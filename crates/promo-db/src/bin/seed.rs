//! # Seed Data Generator
//!
//! Populates the database with sample customers and discount definitions
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p promo-db --bin seed
//!
//! # Specify database path
//! cargo run -p promo-db --bin seed -- --db ./data/promo.db
//! ```
//!
//! ## Generated Data
//! A spread that exercises every eligibility rule:
//! - Open percentage and fixed codes
//! - A capped percentage code (boundary-testable)
//! - Limited-use and per-customer-limited codes
//! - Member-only and customer-bound discounts
//! - A store-scoped code
//! - An expired code and an inactive code
//! - One automatic (code-less) member discount

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use promo_core::{Applicability, Customer, Discount, DiscountType};
use promo_db::{Database, DbConfig};

/// Sample customers: (name, is_member)
const CUSTOMERS: &[(&str, bool)] = &[
    ("Ada Wijaya", true),
    ("Budi Santoso", true),
    ("Citra Lestari", false),
    ("Dewi Anggraini", false),
    ("Eko Prasetyo", true),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Repository debug logs become visible with RUST_LOG=debug
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./promo_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Promo Engine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./promo_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Promo Engine Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.discounts().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} discounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding customers...");

    let mut member_id = String::new();
    for (name, is_member) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            is_member: *is_member,
        };
        if *is_member && member_id.is_empty() {
            member_id = customer.id.clone();
        }
        db.customers().insert(&customer).await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    println!("Seeding discounts...");

    let discounts = sample_discounts(&member_id);
    let count = discounts.len();
    for discount in &discounts {
        promo_core::validation::validate_definition(discount)?;
        db.discounts().insert(discount).await?;
    }
    println!("✓ {} discounts", count);

    println!();
    println!("Done. Try:");
    println!("  WELCOME10    10% off, uncapped");
    println!("  BIGSPENDER   10% off above 50,000, capped at 20,000");
    println!("  TAKE15K      fixed 15,000 off");
    println!("  LASTTICKET   single remaining use");
    Ok(())
}

/// A definition spread covering every rule the engine enforces.
fn sample_discounts(member_customer_id: &str) -> Vec<Discount> {
    let now = Utc::now();

    let base = Discount {
        id: String::new(),
        code: None,
        name: String::new(),
        discount_type: DiscountType::Percentage,
        discount_value: 0,
        min_purchase: 0,
        max_discount: 0,
        applicable_to: Applicability::All,
        customer_id: None,
        store_id: None,
        is_automatic: false,
        usage_limit: 0,
        usage_count: 0,
        usage_per_customer: 0,
        start_date: None,
        end_date: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let with = |code: Option<&str>, name: &str, f: &dyn Fn(&mut Discount)| {
        let mut d = Discount {
            id: Uuid::new_v4().to_string(),
            code: code.map(str::to_string),
            name: name.to_string(),
            ..base.clone()
        };
        f(&mut d);
        d
    };

    vec![
        with(Some("WELCOME10"), "Welcome 10%", &|d| {
            d.discount_value = 10;
        }),
        with(Some("BIGSPENDER"), "Big Spender", &|d| {
            d.discount_value = 10;
            d.min_purchase = 50_000;
            d.max_discount = 20_000;
        }),
        with(Some("TAKE15K"), "Fixed 15,000", &|d| {
            d.discount_type = DiscountType::Fixed;
            d.discount_value = 15_000;
        }),
        with(Some("LASTTICKET"), "Single Remaining Use", &|d| {
            d.discount_type = DiscountType::Fixed;
            d.discount_value = 5_000;
            d.usage_limit = 1;
        }),
        with(Some("ONCEEACH"), "Once Per Customer", &|d| {
            d.discount_value = 5;
            d.usage_per_customer = 1;
        }),
        with(Some("MEMBERS20"), "Members 20%", &|d| {
            d.discount_value = 20;
            d.applicable_to = Applicability::Member;
        }),
        with(Some("VIPONLY"), "VIP Personal Discount", &|d| {
            d.discount_type = DiscountType::Fixed;
            d.discount_value = 25_000;
            d.applicable_to = Applicability::SpecificCustomer;
            d.customer_id = Some(member_customer_id.to_string());
        }),
        with(Some("STORE1"), "Store One Opening", &|d| {
            d.discount_value = 15;
            d.store_id = Some("store-1".to_string());
        }),
        with(Some("BYGONES"), "Expired Promo", &|d| {
            d.discount_value = 50;
            d.end_date = Some(now - Duration::days(30));
        }),
        with(Some("PAUSED"), "Paused Promo", &|d| {
            d.discount_value = 30;
            d.is_active = false;
        }),
        // Automatic member pricing, applied by id with no code
        with(None, "Member Pricing 5%", &|d| {
            d.discount_value = 5;
            d.applicable_to = Applicability::Member;
            d.is_automatic = true;
        }),
    ]
}
