//! eBay Sync - Seller Account Mirror
//!
//! Synchronizes seller-account state between the eBay Trading API and a local
//! SQLite catalog database: category hierarchy, per-category features, an
//! active-listing snapshot, and the catalog's recorded eBay ids.

pub mod categories;
pub mod config;
pub mod database;
pub mod error;
pub mod features;
pub mod listings;
pub mod orders;
pub mod reconcile;
pub mod trading;

pub use categories::{build_category_tree, CategoryNode, CategoryTree};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use features::{aggregate_features, FeatureDataset};
pub use listings::{fetch_active_listings, ListingRow};
pub use reconcile::{reconcile_marketplace_ids, ReconcileOutcome};
pub use trading::{EbayTradingClient, TradingApi};
