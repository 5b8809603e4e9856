//! Sync configuration
//!
//! Everything the sync needs at construction time is carried explicitly in
//! `SyncConfig` rather than read from ambient state, so components stay
//! testable in isolation.

use crate::error::{Result, SyncError};
use std::collections::HashSet;

/// eBay site id for the UK site (0 = US, 3 = UK)
pub const DEFAULT_SITE_ID: u32 = 3;

/// Gross-to-net divisor for 20% VAT
pub const DEFAULT_VAT_DIVISOR: f64 = 1.2;

/// Configuration for one sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// eBay site id the Trading API calls are scoped to
    pub site_id: u32,
    /// How many days of orders to fetch (must be >= 1)
    pub sync_days: i64,
    /// Divisor applied to gross listing prices to strip VAT
    pub vat_divisor: f64,
    /// Top-level categories whose feature queries are unreliable; their
    /// immediate children are queried instead, and the parent itself is
    /// queried depth-limited to its own level.
    pub split_categories: HashSet<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        // Category 1 ("Collectables") has a habit of timing out when queried
        // whole, hence the default split set.
        let mut split_categories = HashSet::new();
        split_categories.insert("1".to_string());
        Self {
            site_id: DEFAULT_SITE_ID,
            sync_days: 1,
            vat_divisor: DEFAULT_VAT_DIVISOR,
            split_categories,
        }
    }
}

impl SyncConfig {
    /// Validate the configuration before any network activity begins
    pub fn validate(&self) -> Result<()> {
        if self.sync_days < 1 {
            return Err(SyncError::Config(format!(
                "Invalid number of days: {}",
                self.sync_days
            )));
        }
        if self.vat_divisor <= 0.0 {
            return Err(SyncError::Config(format!(
                "VAT divisor must be positive, got {}",
                self.vat_divisor
            )));
        }
        Ok(())
    }
}
