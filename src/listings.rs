//! Active listing retrieval
//!
//! Pulls the account's currently active listings via `GetMyeBaySelling` and
//! converts them into snapshot rows for the listing cache table. Prices
//! arrive gross and are stored VAT-exclusive.

use crate::error::{Result, SyncError};
use crate::trading::fetcher::{fetch_all_pages, Page, PagedSource, ENTRIES_PER_PAGE};
use crate::trading::{as_sequence, int_field, str_field, TradingApi};
use serde_json::{json, Value};

/// One row of the listing snapshot table
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    /// Seller SKU; empty when the listing carries none
    pub sku: String,
    /// eBay's own listing identifier
    pub ebay_id: String,
    pub quantity: i64,
    /// Current price with VAT stripped
    pub price: f64,
    pub site: String,
    pub hit_count: i64,
    pub watch_count: i64,
    pub question_count: i64,
}

/// `PagedSource` over the account's active listings
pub struct ActiveListingsSource<'a, A: TradingApi> {
    api: &'a A,
}

impl<'a, A: TradingApi> ActiveListingsSource<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<A: TradingApi> PagedSource for ActiveListingsSource<'_, A> {
    fn fetch_page(&mut self, page: u32) -> Result<Page> {
        let params = json!({
            "ActiveList": {
                "Include": true,
                "Pagination": {
                    "EntriesPerPage": ENTRIES_PER_PAGE,
                    "PageNumber": page,
                },
                "IncludeWatchCount": true,
            },
            "DetailLevel": "ReturnAll",
        });
        let response = self.api.execute("GetMyeBaySelling", &params)?;

        let active = response.get("ActiveList").ok_or_else(|| {
            SyncError::MalformedResponse("GetMyeBaySelling response has no ActiveList".to_string())
        })?;
        let pagination = active.get("PaginationResult").cloned().unwrap_or(Value::Null);
        let total_pages = int_field(&pagination, "TotalNumberOfPages").unwrap_or(0);
        let total_entries = int_field(&pagination, "TotalNumberOfEntries").map(|n| n as u32);

        let records = match active.get("ItemArray").and_then(|a| a.get("Item")) {
            Some(items) => as_sequence(items),
            None => Vec::new(),
        };

        Ok(Page {
            records,
            has_more: (page as i64) < total_pages,
            total_entries,
        })
    }
}

/// Fetch every active listing and convert it into a snapshot row
pub fn fetch_active_listings<A: TradingApi>(api: &A, vat_divisor: f64) -> Result<Vec<ListingRow>> {
    let mut source = ActiveListingsSource::new(api);
    let items = fetch_all_pages(&mut source)?;
    let rows: Result<Vec<ListingRow>> = items
        .iter()
        .map(|item| parse_listing(item, vat_divisor))
        .collect();
    let rows = rows?;
    log::info!("Fetched {} active listings", rows.len());
    Ok(rows)
}

/// Convert one `ActiveList` item into a snapshot row.
///
/// SKU defaults to empty; hit/watch/question counts default to zero since
/// the marketplace omits them for some account tiers.
pub fn parse_listing(item: &Value, vat_divisor: f64) -> Result<ListingRow> {
    let ebay_id = str_field(item, "ItemID")
        .ok_or_else(|| SyncError::MalformedResponse("active listing has no ItemID".to_string()))?
        .to_string();

    let gross = item
        .get("SellingStatus")
        .and_then(|s| s.get("CurrentPrice"))
        .and_then(price_value)
        .ok_or_else(|| {
            SyncError::MalformedResponse(format!("listing {} has no current price", ebay_id))
        })?;

    Ok(ListingRow {
        sku: str_field(item, "SKU").unwrap_or_default().to_string(),
        ebay_id,
        quantity: int_field(item, "QuantityAvailable").unwrap_or(0),
        price: gross / vat_divisor,
        site: str_field(item, "Site").unwrap_or_default().to_string(),
        hit_count: int_field(item, "HitCount").unwrap_or(0),
        watch_count: int_field(item, "WatchCount").unwrap_or(0),
        question_count: int_field(item, "TotalQuestionCount").unwrap_or(0),
    })
}

/// The price `value` arrives as either a JSON number or a decimal string
fn price_value(price: &Value) -> Option<f64> {
    match price.get("value")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
