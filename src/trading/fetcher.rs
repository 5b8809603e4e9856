//! Paginated fetching for Trading API list calls
//!
//! Trading API results are paginated; the fetcher drives a `PagedSource`
//! with an incrementing 1-based page index until the source is exhausted,
//! accumulating every page's records into one flat sequence.

use crate::error::Result;
use serde_json::Value;

/// Fixed page size used for every paged Trading API call
pub const ENTRIES_PER_PAGE: u32 = 100;

/// One page of results from a paged Trading API call
#[derive(Debug, Default)]
pub struct Page {
    /// Records on this page; empty pages are legitimate
    pub records: Vec<Value>,
    /// Whether the source reports further pages after this one
    pub has_more: bool,
    /// Total record count declared by the source; only the value reported
    /// on page 1 is consulted.
    pub total_entries: Option<u32>,
}

/// A paged remote data source keyed by 1-based page number
pub trait PagedSource {
    fn fetch_page(&mut self, page: u32) -> Result<Page>;
}

/// Fetch every page of a source and concatenate the records in page order.
///
/// Stops when the source reports no more pages, or when the record count
/// declared on page 1 has been accumulated. Transport failures propagate
/// unchanged; there are no retries here.
pub fn fetch_all_pages<S: PagedSource>(source: &mut S) -> Result<Vec<Value>> {
    let mut records: Vec<Value> = Vec::new();
    let mut declared_total: Option<u32> = None;
    let mut page = 1;

    loop {
        let result = source.fetch_page(page)?;
        if page == 1 {
            declared_total = result.total_entries;
        }
        records.extend(result.records);

        let total_reached =
            matches!(declared_total, Some(total) if records.len() as u32 >= total);
        if !result.has_more || total_reached {
            break;
        }
        page += 1;
    }

    log::debug!("Fetched {} records over {} page(s)", records.len(), page);
    Ok(records)
}
