//! # Seed Data Loader
//!
//! Populates a database with the sample storefront catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopkeep_dev.db
//! cargo run -p shopkeep-db --bin seed
//!
//! # Specify database path
//! cargo run -p shopkeep-db --bin seed -- --db ./data/shopkeep.db
//! ```
//!
//! Products, stock levels and carts are listed in `shopkeep_db::seed`.

use std::env;

use shopkeep_core::ActorId;
use shopkeep_db::seed::seed_sample_data;
use shopkeep_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shopkeep_dev.db");

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
                println!("Shopkeep Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shopkeep_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopkeep Seed Data Loader");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let Some(report) = seed_sample_data(&db).await? else {
        println!("⚠ Database already has products");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to reload.");
        return Ok(());
    };

    println!();
    println!("✓ Inserted {} products", report.products);
    for record in db.inventory().list().await? {
        let title = db
            .catalog()
            .get(record.product_id)
            .await?
            .map(|p| p.title)
            .unwrap_or_default();
        println!("  #{} {:<16} stock {}", record.product_id, title, record.stock);
    }

    println!();
    println!("✓ Inserted {} cart items", report.cart_items);
    for actor in [ActorId(1), ActorId(2)] {
        let items = db.carts().load_items(actor).await?;
        println!("  actor {}: {} line(s)", actor, items.len());
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
