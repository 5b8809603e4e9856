//! Database operations for ebay_sync
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! The listing snapshot rebuild runs inside a transaction so readers never
//! observe a partially rebuilt table.

use crate::error::Result;
use crate::listings::ListingRow;
use crate::reconcile::CatalogStore;
use rusqlite::{params, Connection, Transaction};
use std::collections::BTreeMap;

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `ebay_listings`: full-refresh snapshot of currently active listings
/// - `items`: the local catalog (normally owned by the catalog application;
///   created here so a fresh database is usable immediately)
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        -- Listing snapshot; truncated and repopulated every run
        CREATE TABLE IF NOT EXISTS ebay_listings (
            sku TEXT NOT NULL DEFAULT '',
            ebay_id TEXT NOT NULL,
            qty INTEGER NOT NULL DEFAULT 0,
            price REAL NOT NULL DEFAULT 0,
            site TEXT NOT NULL DEFAULT '',
            hit_count INTEGER NOT NULL DEFAULT 0,
            watch_count INTEGER NOT NULL DEFAULT 0,
            question_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_ebay_listings_sku ON ebay_listings(sku);

        -- Local catalog items; ebay_id is mutated only by the reconciler
        CREATE TABLE IF NOT EXISTS items (
            item_code TEXT PRIMARY KEY,
            ebay_id TEXT NOT NULL DEFAULT ''
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Replace the listing snapshot with a fresh set of rows.
///
/// Clears all prior rows unconditionally and inserts the new ones inside a
/// single transaction; the snapshot is a cache, not a log.
pub fn replace_listings(conn: &mut Connection, rows: &[ListingRow]) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let count = replace_listings_tx(&tx, rows)?;
    tx.commit()?;
    Ok(count)
}

fn replace_listings_tx(tx: &Transaction<'_>, rows: &[ListingRow]) -> DbResult<usize> {
    tx.execute("DELETE FROM ebay_listings", [])?;

    let mut stmt = tx.prepare_cached(
        "INSERT INTO ebay_listings
         (sku, ebay_id, qty, price, site, hit_count, watch_count, question_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    for row in rows {
        stmt.execute(params![
            &row.sku,
            &row.ebay_id,
            row.quantity,
            row.price,
            &row.site,
            row.hit_count,
            row.watch_count,
            row.question_count,
        ])?;
    }

    log::info!("Rebuilt listing snapshot with {} row(s)", rows.len());
    Ok(rows.len())
}

/// Map every snapshot row's SKU to its live eBay id
pub fn snapshot_ids(conn: &Connection) -> DbResult<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT sku, ebay_id FROM ebay_listings")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

/// Number of rows currently in the listing snapshot
pub fn listing_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM ebay_listings", [], |row| row.get(0))
}

/// Catalog access over the local `items` table
pub struct SqliteCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl CatalogStore for SqliteCatalog<'_> {
    fn marketplace_ids(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT item_code, IFNULL(ebay_id, '') FROM items")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let map: DbResult<BTreeMap<String, String>> = rows.collect();
        Ok(map?)
    }

    fn set_marketplace_id(&self, item_code: &str, ebay_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE items SET ebay_id = ?1 WHERE item_code = ?2",
            params![ebay_id, item_code],
        )?;
        log::debug!("Set ebay_id of item {} to '{}'", item_code, ebay_id);
        Ok(())
    }
}
