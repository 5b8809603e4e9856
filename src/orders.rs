//! Recent order retrieval
//!
//! `GetOrders` over the configured sync window, driven through the shared
//! paginated fetcher. Orders are returned raw; order import itself lives in
//! the catalog application.

use crate::error::Result;
use crate::trading::fetcher::{fetch_all_pages, Page, PagedSource, ENTRIES_PER_PAGE};
use crate::trading::{as_sequence, int_field, str_field, TradingApi};
use serde_json::{json, Value};

/// `PagedSource` over recent orders
pub struct OrdersSource<'a, A: TradingApi> {
    api: &'a A,
    sync_days: i64,
}

impl<'a, A: TradingApi> OrdersSource<'a, A> {
    pub fn new(api: &'a A, sync_days: i64) -> Self {
        Self { api, sync_days }
    }
}

impl<A: TradingApi> PagedSource for OrdersSource<'_, A> {
    fn fetch_page(&mut self, page: u32) -> Result<Page> {
        let params = json!({
            "NumberOfDays": self.sync_days,
            "Pagination": {
                "EntriesPerPage": ENTRIES_PER_PAGE,
                "PageNumber": page,
            },
        });
        let response = self.api.execute("GetOrders", &params)?;

        // Pages with a zero actual count carry no usable OrderArray
        let returned = int_field(&response, "ReturnedOrderCountActual").unwrap_or(0);
        let records = if returned > 0 {
            match response.get("OrderArray").and_then(|a| a.get("Order")) {
                Some(orders) => as_sequence(orders),
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        Ok(Page {
            records,
            has_more: str_field(&response, "HasMoreOrders") == Some("true"),
            total_entries: None,
        })
    }
}

/// Fetch every order placed in the last `sync_days` days
pub fn fetch_recent_orders<A: TradingApi>(api: &A, sync_days: i64) -> Result<Vec<Value>> {
    let mut source = OrdersSource::new(api, sync_days);
    let orders = fetch_all_pages(&mut source)?;
    log::info!("Fetched {} orders from the last {} day(s)", orders.len(), sync_days);
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct PagedApi {
        pages: Vec<Value>,
        requested: RefCell<Vec<Value>>,
    }

    impl TradingApi for PagedApi {
        fn execute(&self, operation: &str, params: &Value) -> Result<Value> {
            assert_eq!(operation, "GetOrders");
            self.requested.borrow_mut().push(params.clone());
            let page = params["Pagination"]["PageNumber"].as_u64().unwrap() as usize;
            Ok(self.pages[page - 1].clone())
        }
    }

    #[test]
    fn pages_until_has_more_orders_is_false() {
        let api = PagedApi {
            pages: vec![
                json!({
                    "ReturnedOrderCountActual": "2",
                    "HasMoreOrders": "true",
                    "OrderArray": {"Order": [{"OrderID": "1"}, {"OrderID": "2"}]}
                }),
                json!({
                    "ReturnedOrderCountActual": "1",
                    "HasMoreOrders": "false",
                    "OrderArray": {"Order": {"OrderID": "3"}}
                }),
            ],
            requested: RefCell::new(Vec::new()),
        };

        let orders = fetch_recent_orders(&api, 7).unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[2]["OrderID"], "3");

        let requested = api.requested.borrow();
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0]["NumberOfDays"], 7);
        assert_eq!(requested[0]["Pagination"]["EntriesPerPage"], 100);
    }

    #[test]
    fn zero_count_page_contributes_nothing() {
        let api = PagedApi {
            pages: vec![json!({
                "ReturnedOrderCountActual": "0",
                "HasMoreOrders": "false",
                "OrderArray": {"Order": [{"OrderID": "stale"}]}
            })],
            requested: RefCell::new(Vec::new()),
        };
        let orders = fetch_recent_orders(&api, 1).unwrap();
        assert!(orders.is_empty());
    }
}
