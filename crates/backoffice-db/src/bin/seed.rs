//! # Seed Data Generator
//!
//! Populates a database with demo products and orders for development.
//!
//! ## Usage
//! ```bash
//! # 200 products, 20 orders (default)
//! cargo run -p backoffice-db --bin seed
//!
//! # Custom amounts
//! cargo run -p backoffice-db --bin seed -- --products 500 --orders 50
//!
//! # Database path (falls back to $BACKOFFICE_DB_PATH, then ./backoffice_dev.db)
//! cargo run -p backoffice-db --bin seed -- --db ./data/orders.db
//! ```
//!
//! Orders are built through the engine, so stock is reserved exactly as in
//! production and every order walks the lifecycle a little way.

use std::env;

use backoffice_core::{NewOrder, NewProduct, OrderStatus};
use backoffice_db::config::DB_PATH_VAR;
use backoffice_db::telemetry::init_tracing;
use backoffice_db::{Database, DbConfig, EngineConfig};

/// Product families for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "LAP",
        &[
            "Ultrabook 13",
            "Ultrabook 15",
            "Workstation 16",
            "Chromebook",
            "Gaming Laptop",
        ],
    ),
    (
        "MON",
        &[
            "Monitor 24",
            "Monitor 27",
            "Monitor 32 4K",
            "Portable Monitor",
        ],
    ),
    (
        "PER",
        &[
            "Wireless Mouse",
            "Mechanical Keyboard",
            "USB-C Dock",
            "Webcam HD",
            "Headset",
            "Mouse Pad",
        ],
    ),
    (
        "CAB",
        &[
            "HDMI Cable",
            "USB-C Cable",
            "DisplayPort Cable",
            "Ethernet Cable",
        ],
    ),
];

/// Variants with a price add-on in cents
const VARIANTS: &[(&str, i64)] = &[
    ("Basic", 0),
    ("Plus", 1500),
    ("Pro", 4500),
    ("Max", 9000),
];

const SALESPEOPLE: &[&str] = &["sp-ana", "sp-ben", "sp-chloe"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut product_count: usize = 200;
    let mut order_count: usize = 20;
    let mut db_path = env::var(DB_PATH_VAR).unwrap_or_else(|_| String::from("./backoffice_dev.db"));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    product_count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    order_count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Back office seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: 200)");
                println!("  -o, --orders <N>    Number of orders to generate (default: 20)");
                println!("  -d, --db <PATH>     Database file (default: ${DB_PATH_VAR} or ./backoffice_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Back office seed data generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", product_count);
    println!("Orders:   {}", order_count);

    let engine = EngineConfig::from_env()?;
    println!("Engine:   {}", serde_json::to_string(&engine)?);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?.with_engine(engine);

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Products
    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut product_ids = Vec::with_capacity(product_count);

    'outer: for round in 0..100 {
        for (category_code, names) in CATEGORIES {
            for (name_idx, name) in names.iter().enumerate() {
                for (variant_idx, (variant, price_addon)) in VARIANTS.iter().enumerate() {
                    if product_ids.len() >= product_count {
                        break 'outer;
                    }

                    let seed = product_ids.len();
                    let new = demo_product(
                        category_code,
                        name,
                        variant,
                        *price_addon,
                        round,
                        name_idx * 10 + variant_idx,
                        seed,
                    );
                    match db.catalog().create_product(new).await {
                        Ok(product) => product_ids.push(product.id),
                        Err(e) => eprintln!("Failed to create product: {}", e),
                    }
                }
            }
        }
    }

    println!("✓ Generated {} products in {:?}", product_ids.len(), start.elapsed());

    if product_ids.is_empty() {
        return Ok(());
    }

    // Orders
    println!();
    println!("Generating orders...");

    let mut created = 0;
    let mut rejected_lines = 0;

    for n in 0..order_count {
        let order = db
            .orders()
            .create_order(NewOrder {
                customer_id: format!("cust-{:04}", n % 37),
                salesperson_id: SALESPEOPLE[n % SALESPEOPLE.len()].to_string(),
                notes: (n % 4 == 0).then(|| "Deliver to reception".to_string()),
            })
            .await?;

        let lines = 1 + n % 4;
        for k in 0..lines {
            let product_id = &product_ids[(n * 7 + k * 13) % product_ids.len()];
            let quantity = 1 + ((n + k) % 3) as i64;
            if db
                .line_items()
                .add_line_item(&order.id, product_id, quantity)
                .await
                .is_err()
            {
                rejected_lines += 1;
            }
        }

        if n % 5 == 1 {
            db.orders().apply_discount_percentage(&order.id, 5.0).await?;
        }

        // Walk part of the lifecycle: 0..=4 steps forward
        for target in OrderStatus::ALL.iter().skip(1).take(n % 5) {
            db.orders().change_status(&order.id, *target).await?;
        }

        created += 1;
    }

    println!("✓ Generated {} orders ({} line items rejected by stock rules)", created, rejected_lines);

    let critical = db.inventory().critical_stock_products().await?;
    println!();
    println!("Critical stock: {} products", critical.len());
    for product in critical.iter().take(5) {
        println!("  {} {} (stock {})", product.sku, product.name, product.stock);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one demo product.
fn demo_product(
    category: &str,
    name: &str,
    variant: &str,
    price_addon: i64,
    round: usize,
    index: usize,
    seed: usize,
) -> NewProduct {
    let sku = format!("{}-{:02}{:02}", category, round, index);

    // $9.99 - $89.99 + variant addon
    let price_cents = 999 + ((seed * 37) % 8000) as i64 + price_addon;

    // 0 - 24; some land at or below the critical threshold
    let stock = (seed % 25) as i64;

    let name = if round == 0 {
        format!("{} {}", name, variant)
    } else {
        format!("{} {} (batch {})", name, variant, round + 1)
    };

    NewProduct {
        sku,
        name,
        description: Some(format!("{} demo item", category)),
        price_cents,
        stock,
        status: None,
    }
}
