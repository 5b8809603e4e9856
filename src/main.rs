//! eBay Sync - Seller Account Mirror
//!
//! CLI entry point. Each subcommand is one synchronous run-to-completion
//! sync: listings (snapshot + id reconciliation), categories, features, or
//! orders.

use clap::{Parser, Subcommand};
use ebay_sync::categories::{build_category_tree, parse_category_records, CategoryTree};
use ebay_sync::config::{DEFAULT_SITE_ID, DEFAULT_VAT_DIVISOR};
use ebay_sync::database::{self, SqliteCatalog};
use ebay_sync::features::aggregate_features;
use ebay_sync::listings::fetch_active_listings;
use ebay_sync::orders::fetch_recent_orders;
use ebay_sync::reconcile::{reconcile_marketplace_ids, LogNotifier};
use ebay_sync::trading::{as_sequence, EbayTradingClient, TradingApi, DEFAULT_ENDPOINT};
use ebay_sync::{Result, SyncConfig, SyncError};
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;

/// eBay seller sync - mirrors listings and category metadata into SQLite
#[derive(Parser, Debug)]
#[command(name = "ebay_sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// eBay site id (0 = US, 3 = UK)
    #[arg(long, default_value_t = DEFAULT_SITE_ID)]
    site_id: u32,

    /// How many days of orders to fetch
    #[arg(long, default_value_t = 1)]
    sync_days: i64,

    /// Divisor applied to gross prices to strip VAT
    #[arg(long, default_value_t = DEFAULT_VAT_DIVISOR)]
    vat_divisor: f64,

    /// Top-level category whose features are queried via its children
    /// (repeatable)
    #[arg(long = "split-category", default_values_t = vec!["1".to_string()])]
    split_categories: Vec<String>,

    /// Trading API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the active-listing snapshot and reconcile catalog eBay ids
    Listings,
    /// Fetch the category hierarchy and write the category cache
    Categories,
    /// Aggregate category features and write the feature cache
    Features,
    /// Fetch recent orders and report the count
    Orders,
}

/// Returns the default database path: ~/.local/share/ebay_sync/sync.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ebay_sync")
        .join("sync.db")
        .to_string_lossy()
        .to_string()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = SyncConfig {
        site_id: args.site_id,
        sync_days: args.sync_days,
        vat_divisor: args.vat_divisor,
        split_categories: args.split_categories.iter().cloned().collect(),
    };
    // Configuration problems surface before any network activity
    config.validate()?;

    let auth_token = std::env::var("EBAY_AUTH_TOKEN")
        .map_err(|_| SyncError::Config("EBAY_AUTH_TOKEN is not set".to_string()))?;
    let api = EbayTradingClient::new(&args.endpoint, config.site_id, auth_token);

    match args.command {
        Command::Listings => run_listings(&args.database, &api, &config),
        Command::Categories => {
            let tree = fetch_category_tree(&api)?;
            write_cache("categories.json", &tree)
        }
        Command::Features => {
            let tree = fetch_category_tree(&api)?;
            let dataset = aggregate_features(&api, &tree, &config.split_categories)?;
            write_cache("features.json", &dataset)
        }
        Command::Orders => {
            let orders = fetch_recent_orders(&api, config.sync_days)?;
            log::info!("{} order(s) in the last {} day(s)", orders.len(), config.sync_days);
            Ok(())
        }
    }
}

/// Rebuild the listing snapshot and reconcile the catalog's recorded ids
fn run_listings<A: TradingApi>(database: &str, api: &A, config: &SyncConfig) -> Result<()> {
    let db_path = PathBuf::from(database);
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            log::info!("Created directory: {}", parent.display());
        }
    }

    let mut conn = Connection::open(&db_path)?;
    log::info!("Opened database: {}", db_path.display());
    database::init_schema(&conn)?;

    let rows = fetch_active_listings(api, config.vat_divisor)?;
    database::replace_listings(&mut conn, &rows)?;

    let snapshot = database::snapshot_ids(&conn)?;
    let catalog = SqliteCatalog::new(&conn);
    let outcome = reconcile_marketplace_ids(&snapshot, &catalog, &LogNotifier)?;

    log::info!(
        "Listing sync completed: {} listing(s), {} id write(s), {} unmatched",
        rows.len(),
        outcome.writes(),
        outcome.unmatched
    );
    Ok(())
}

/// Fetch the full category hierarchy and link it into a tree
fn fetch_category_tree<A: TradingApi>(api: &A) -> Result<CategoryTree> {
    let params = json!({"DetailLevel": "ReturnAll", "ViewAllNodes": true});
    let response = api.execute("GetCategories", &params)?;

    let entries = match response.get("CategoryArray").and_then(|a| a.get("Category")) {
        Some(categories) => as_sequence(categories),
        None => Vec::new(),
    };
    let records = parse_category_records(&entries)?;
    build_category_tree(records)
}

/// Write a cache snapshot as pretty JSON under the data directory
fn write_cache<T: serde::Serialize>(name: &str, value: &T) -> Result<()> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ebay_sync");
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    log::info!("Wrote cache snapshot: {}", path.display());
    Ok(())
}
