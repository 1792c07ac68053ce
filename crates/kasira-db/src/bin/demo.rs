//! # Settlement Walkthrough
//!
//! Seeds a local database and drives the engine end to end: tiered
//! pricing, the discount stack, a paid settlement, an under-paid
//! settlement that opens a receivable, and the repayment ledger.
//!
//! ## Usage
//! ```bash
//! cargo run -p kasira-db --bin demo
//!
//! # Specify database path
//! cargo run -p kasira-db --bin demo -- --db ./data/kasira.db
//! ```
//!
//! Engine logging goes through `tracing`; raise the filter to watch the
//! transactions:
//! ```bash
//! RUST_LOG=debug cargo run -p kasira-db --bin demo
//! ```
//!
//! Safe to re-run against the same file: the catalog is reused and the
//! shelf is topped up before each walkthrough.

use std::env;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use kasira_core::{
    Cart, Member, Money, PaymentMethod, PriceTier, Product, ReceivableStatus, SettlementOutcome,
};
use kasira_db::{
    Database, DbConfig, DbResult, PageRequest, ReceivableFilter, SettleLine, SettleRequest,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasira_demo.db");

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
                println!("Kasira Settlement Walkthrough");
                println!();
                println!("Usage: demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasira_demo.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kasira Settlement Walkthrough");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    let rice = ensure_product(
        &db,
        "RICE-5KG",
        "Beras 5kg",
        10_000,
        &[PriceTier::new(1, 10_000), PriceTier::new(3, 9_000)],
    )
    .await?;
    let oil = ensure_product(&db, "OIL-1L", "Minyak Goreng 1L", 2_500, &[]).await?;
    let member = ensure_member(&db).await?;

    println!(
        "✓ Catalog ready: {} (tiered), {} (flat), member {} at {}%",
        rice.sku, oil.sku, member.name, member.discount_percent
    );
    println!();

    // -------------------------------------------------------------------------
    // Cart preview (advisory)
    // -------------------------------------------------------------------------

    let mut cart = Cart::new();
    let rice_tiers = db.products().get_tiers(&rice.id).await?;
    cart.add_line(&rice, rice_tiers, 5)?;
    cart.add_line(&oil, vec![], 2)?;

    let preview = db
        .settlement()
        .preview(cart.lines(), Some(&member.id), 2_000)
        .await?;

    println!("Cart preview (5x rice, 2x oil, 5% member, extra 2000 off):");
    println!("  subtotal            {}", preview.subtotal_cents);
    println!("  tier savings        {}", preview.item_discount_cents);
    println!("  member discount     {}", preview.member_discount_cents);
    println!("  additional discount {}", preview.additional_discount_cents);
    println!("  total               {}", preview.total_cents);
    println!();

    // -------------------------------------------------------------------------
    // Paid settlement
    // -------------------------------------------------------------------------

    let lines: Vec<SettleLine> = cart.lines().iter().map(SettleLine::from).collect();
    let receipt = db
        .settlement()
        .settle(SettleRequest {
            lines,
            member_id: Some(member.id.clone()),
            additional_discount_cents: 2_000,
            payment_method: PaymentMethod::Cash,
            tendered_cents: preview.total_cents + 250,
            cashier_id: "cashier-01".to_string(),
            attendant_id: None,
            note: None,
        })
        .await?;

    assert_eq!(receipt.outcome, SettlementOutcome::Paid);
    assert_eq!(receipt.sale.total_cents, preview.total_cents);
    println!(
        "✓ Settled {}: total {}, tendered {}, change {}",
        receipt.sale.receipt_number,
        receipt.sale.total_cents,
        receipt.sale.tendered_cents,
        receipt.change_cents
    );

    // -------------------------------------------------------------------------
    // Under-paid settlement opens a receivable
    // -------------------------------------------------------------------------

    let receipt = db
        .settlement()
        .settle(SettleRequest {
            lines: vec![SettleLine {
                product_id: rice.id.clone(),
                quantity: 1,
                note: None,
            }],
            member_id: Some(member.id.clone()),
            additional_discount_cents: 0,
            payment_method: PaymentMethod::Cash,
            tendered_cents: 4_000,
            cashier_id: "cashier-01".to_string(),
            attendant_id: None,
            note: None,
        })
        .await?;

    let receivable = receipt.receivable.expect("short tender opens a receivable");
    println!(
        "✓ Short tender: sale {} is {:?}, receivable owes {} with {} already down",
        receipt.sale.receipt_number,
        receipt.sale.status,
        receivable.amount_due_cents,
        receivable.amount_paid_cents
    );

    // -------------------------------------------------------------------------
    // Repayment ledger
    // -------------------------------------------------------------------------

    let posted = db
        .receivables()
        .apply_payment(&receivable.id, Money::from_cents(3_000), PaymentMethod::Cash)
        .await?;
    println!(
        "✓ Payment 3000 recorded: {:?}, {} remaining",
        posted.receivable.status, posted.remaining_cents
    );

    let posted = db
        .receivables()
        .apply_payment(
            &receivable.id,
            Money::from_cents(posted.remaining_cents),
            PaymentMethod::Transfer,
        )
        .await?;
    assert_eq!(posted.receivable.status, ReceivableStatus::Paid);

    let sale = db.sales().get_by_id(&receivable.sale_id).await?.unwrap();
    println!(
        "✓ Balance cleared: receivable {:?}, originating sale flipped to {:?}",
        posted.receivable.status, sale.status
    );

    let page = db
        .receivables()
        .list_pending(&ReceivableFilter::default(), PageRequest::default())
        .await?;
    println!(
        "✓ {} receivable(s) still pending across the store",
        page.pagination.total_items
    );

    println!();
    println!("✓ Walkthrough complete");

    Ok(())
}

/// Fetches a product by SKU, creating it on first run. The shelf is
/// topped up so repeated walkthroughs never run the stock dry.
async fn ensure_product(
    db: &Database,
    sku: &str,
    name: &str,
    price_cents: i64,
    tiers: &[PriceTier],
) -> DbResult<Product> {
    if let Some(existing) = db.products().get_by_sku(sku).await? {
        db.products().restock(&existing.id, 50).await?;
        return db
            .products()
            .get_by_id(&existing.id)
            .await
            .map(|p| p.expect("product just restocked"));
    }

    let now = Utc::now();
    let product = Product {
        id: uuid::Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        base_price_cents: price_cents,
        current_stock: 50,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await?;
    if !tiers.is_empty() {
        db.products().set_tiers(&product.id, tiers).await?;
    }
    Ok(product)
}

/// Fetches the walkthrough member, creating them on first run.
async fn ensure_member(db: &Database) -> DbResult<Member> {
    if let Some(existing) = db.members().get_by_id("demo-member").await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let member = Member {
        id: "demo-member".to_string(),
        name: "Siti Rahma".to_string(),
        phone: Some("0812-0000-0000".to_string()),
        discount_percent: 5,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.members().insert(&member).await?;
    Ok(member)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kasira_db=trace` - Trace the engine crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kasira_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
