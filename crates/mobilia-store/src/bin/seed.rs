//! # Seed Data Generator
//!
//! Fills a file-backed store with furniture products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default) into ./data
//! cargo run -p mobilia-store --bin seed
//!
//! # Generate custom amount
//! cargo run -p mobilia-store --bin seed -- --count 2000
//!
//! # Specify data directory
//! cargo run -p mobilia-store --bin seed -- --dir ./dev-data
//! ```
//!
//! ## Generated Products
//! Each product has:
//! - Id: `{CATEGORY}-{INDEX}` (e.g. `CHR-0042`)
//! - Name from a category model and a wood finish
//! - Price: 35.00 - 2,400.00
//! - Stock: 0 - 24
//! - Dimensions object (cm) and tag list

use std::env;

use mobilia_core::{fields_from_json, tables, Fields, Filter};
use mobilia_store::{StoreConfig, StoreHandle};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Product categories: (code, category, models, base price)
const CATEGORIES: &[(&str, &str, &[&str], f64)] = &[
    ("CHR", "chair", &["Bistro Chair", "Windsor Chair", "Wingback Chair", "Lounge Chair"], 35.0),
    ("TBL", "table", &["Dining Table", "Coffee Table", "Console Table", "Side Table"], 120.0),
    ("SFA", "sofa", &["Chesterfield Sofa", "Sectional Sofa", "Loveseat", "Daybed"], 650.0),
    ("BED", "bed", &["Platform Bed", "Sleigh Bed", "Bunk Bed", "Canopy Bed"], 480.0),
    ("STO", "storage", &["Bookcase", "Sideboard", "Wardrobe", "Chest of Drawers"], 210.0),
];

/// Finishes with a price multiplier
const FINISHES: &[(&str, f64)] = &[
    ("Pine", 1.0),
    ("Oak", 1.4),
    ("Walnut", 1.8),
    ("Teak", 2.1),
    ("Painted White", 1.1),
];

const DEFAULT_COUNT: usize = 500;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut data_dir = String::from("./data");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(DEFAULT_COUNT);
                    i += 1;
                }
            }
            "--dir" | "-d" => {
                if i + 1 < args.len() {
                    data_dir = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mobilia POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: {})", DEFAULT_COUNT);
                println!("  -d, --dir <PATH>   Data directory (default: ./data)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = StoreConfig::new(&data_dir)
        .index(tables::PRODUCTS, "category")
        .index(tables::PRODUCTS, "finish");
    let store = StoreHandle::open(&config)?;

    info!(dir = %data_dir, count, "Seeding products");

    let existing = store.count(tables::PRODUCTS, &Filter::new()).await?;
    if existing > 0 {
        println!("Store already has {} products, skipping seed.", existing);
        println!("Delete {} to regenerate.", data_dir);
        return Ok(());
    }

    let start = std::time::Instant::now();
    let products: Vec<Fields> = (0..count).map(generate_product).collect();
    let created = store.batch_create(tables::PRODUCTS, products).await?;
    let elapsed = start.elapsed();

    println!("Generated {} products in {:?}", created.len(), elapsed);

    // Exercise the index and aggregation paths on the fresh data
    let oak = Filter::new().eq("finish", "Oak").gt("stock", 0);
    let oak_in_stock = store.count(tables::PRODUCTS, &oak).await?;
    let stock_total = store
        .aggregate(tables::PRODUCTS, "stock", "sum", &Filter::new())
        .await?;
    let avg_sofa = store
        .aggregate(tables::PRODUCTS, "price", "avg", &Filter::new().eq("category", "sofa"))
        .await?;

    println!("Oak pieces in stock: {}", oak_in_stock);
    println!("Units in stock:      {}", stock_total);
    println!("Average sofa price:  {:.2}", avg_sofa);

    store.close();
    Ok(())
}

/// Builds one deterministic product from its sequence number.
fn generate_product(n: usize) -> Fields {
    let (code, category, models, base_price) = CATEGORIES[n % CATEGORIES.len()];
    let model = models[(n / CATEGORIES.len()) % models.len()];
    let (finish, multiplier) = FINISHES[(n / 7) % FINISHES.len()];

    let price = ((base_price * multiplier + (n % 13) as f64 * 4.5) * 100.0).round() / 100.0;
    let stock = (n * 7 + 3) % 25;

    fields_from_json(json!({
        "id": format!("{}-{:04}", code, n),
        "name": format!("{} {}", finish, model),
        "category": category,
        "finish": finish,
        "price": price,
        "stock": stock,
        "dimensions": {
            "width": 40 + (n % 9) * 20,
            "depth": 40 + (n % 5) * 15,
            "height": 45 + (n % 4) * 30,
        },
        "tags": [category, finish.to_lowercase()],
    }))
}
