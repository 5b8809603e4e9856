//! Marketplace id reconciliation
//!
//! Compares the listing snapshot against the local catalog's recorded eBay
//! ids and applies corrective updates: live ids are adopted, ids with no
//! matching live listing are retracted, and live listings with no catalog
//! counterpart are reported to the operator without failing the run.

use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Read/write access to the catalog's marketplace-id field.
///
/// The catalog itself is owned by the catalog application; this is the only
/// contract through which the reconciler mutates it.
pub trait CatalogStore {
    /// Item code -> recorded eBay id for every catalog item
    fn marketplace_ids(&self) -> Result<BTreeMap<String, String>>;
    /// Overwrite one item's recorded eBay id, keyed by the item's own code
    fn set_marketplace_id(&self, item_code: &str, ebay_id: &str) -> Result<()>;
}

/// Fire-and-forget operator notification sink
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Notifier that reports through the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// What a reconciliation run did
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Catalog items whose id was overwritten with the live value
    pub adopted: usize,
    /// Catalog items whose stale id was cleared
    pub retracted: usize,
    /// Live listings with no matching catalog item, reported only
    pub unmatched: usize,
}

impl ReconcileOutcome {
    pub fn writes(&self) -> usize {
        self.adopted + self.retracted
    }
}

/// Reconcile recorded eBay ids against the live snapshot.
///
/// Performs an explicit full-scan outer join over the union of snapshot SKUs
/// and catalog item codes, with absent sides defaulting to the empty string,
/// then applies one corrective action per differing pair. Updates are keyed
/// strictly by the catalog item's own code. Running twice with unchanged
/// inputs performs no writes the second time.
pub fn reconcile_marketplace_ids<C: CatalogStore, N: Notifier>(
    snapshot: &BTreeMap<String, String>,
    catalog: &C,
    notifier: &N,
) -> Result<ReconcileOutcome> {
    let recorded = catalog.marketplace_ids()?;

    let keys: BTreeSet<&String> = snapshot.keys().chain(recorded.keys()).collect();

    let mut outcome = ReconcileOutcome::default();
    for key in keys {
        let live = snapshot.get(key).map(String::as_str).unwrap_or("");
        let stored = recorded.get(key).map(String::as_str).unwrap_or("");
        if live == stored {
            continue;
        }

        if live.is_empty() {
            // Listing is gone; clear the stale id
            catalog.set_marketplace_id(key, "")?;
            outcome.retracted += 1;
        } else if recorded.contains_key(key.as_str()) {
            catalog.set_marketplace_id(key, live)?;
            outcome.adopted += 1;
        } else {
            notifier.notify(&format!(
                "eBay listing {} (SKU '{}') has no matching catalog item; id not recorded",
                live, key
            ));
            outcome.unmatched += 1;
        }
    }

    log::info!(
        "Reconciled ids: {} adopted, {} retracted, {} unmatched",
        outcome.adopted,
        outcome.retracted,
        outcome.unmatched
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory catalog recording every write
    struct MemoryCatalog {
        ids: RefCell<BTreeMap<String, String>>,
        writes: RefCell<Vec<(String, String)>>,
    }

    impl MemoryCatalog {
        fn new(entries: &[(&str, &str)]) -> Self {
            let ids = entries
                .iter()
                .map(|(code, id)| (code.to_string(), id.to_string()))
                .collect();
            Self {
                ids: RefCell::new(ids),
                writes: RefCell::new(Vec::new()),
            }
        }
    }

    impl CatalogStore for MemoryCatalog {
        fn marketplace_ids(&self) -> Result<BTreeMap<String, String>> {
            Ok(self.ids.borrow().clone())
        }

        fn set_marketplace_id(&self, item_code: &str, ebay_id: &str) -> Result<()> {
            self.ids
                .borrow_mut()
                .insert(item_code.to_string(), ebay_id.to_string());
            self.writes
                .borrow_mut()
                .push((item_code.to_string(), ebay_id.to_string()));
            Ok(())
        }
    }

    struct CollectingNotifier {
        messages: RefCell<Vec<String>>,
    }

    impl CollectingNotifier {
        fn new() -> Self {
            Self {
                messages: RefCell::new(Vec::new()),
            }
        }
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    fn snapshot(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(sku, id)| (sku.to_string(), id.to_string()))
            .collect()
    }

    #[test]
    fn adopts_live_id_for_matching_item() {
        let catalog = MemoryCatalog::new(&[("A1", "")]);
        let notifier = CollectingNotifier::new();
        let snap = snapshot(&[("A1", "999")]);

        let outcome = reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        assert_eq!(outcome.adopted, 1);
        assert_eq!(outcome.writes(), 1);
        assert_eq!(
            catalog.ids.borrow().get("A1").map(String::as_str),
            Some("999")
        );
    }

    #[test]
    fn second_run_with_unchanged_inputs_writes_nothing() {
        let catalog = MemoryCatalog::new(&[("A1", "")]);
        let notifier = CollectingNotifier::new();
        let snap = snapshot(&[("A1", "999")]);

        reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        catalog.writes.borrow_mut().clear();

        let outcome = reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        assert_eq!(outcome, ReconcileOutcome::default());
        assert!(catalog.writes.borrow().is_empty());
    }

    #[test]
    fn retracts_id_when_listing_gone() {
        let catalog = MemoryCatalog::new(&[("B2", "777")]);
        let notifier = CollectingNotifier::new();
        let snap = snapshot(&[]);

        let outcome = reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        assert_eq!(outcome.retracted, 1);
        assert_eq!(catalog.ids.borrow().get("B2").map(String::as_str), Some(""));
    }

    #[test]
    fn corrects_mismatched_id() {
        let catalog = MemoryCatalog::new(&[("A1", "111")]);
        let notifier = CollectingNotifier::new();
        let snap = snapshot(&[("A1", "222")]);

        let outcome = reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        assert_eq!(outcome.adopted, 1);
        assert_eq!(
            catalog.ids.borrow().get("A1").map(String::as_str),
            Some("222")
        );
    }

    #[test]
    fn unmatched_listing_notifies_without_writing() {
        let catalog = MemoryCatalog::new(&[]);
        let notifier = CollectingNotifier::new();
        let snap = snapshot(&[("C3", "555")]);

        let outcome = reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        assert_eq!(outcome.unmatched, 1);
        assert_eq!(outcome.writes(), 0);
        assert!(catalog.writes.borrow().is_empty());

        let messages = notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("C3"));
        assert!(messages[0].contains("555"));
    }

    #[test]
    fn orphans_on_both_sides_handled_in_one_run() {
        let catalog = MemoryCatalog::new(&[("A1", ""), ("B2", "777")]);
        let notifier = CollectingNotifier::new();
        let snap = snapshot(&[("A1", "999"), ("C3", "555")]);

        let outcome = reconcile_marketplace_ids(&snap, &catalog, &notifier).unwrap();
        assert_eq!(outcome.adopted, 1);
        assert_eq!(outcome.retracted, 1);
        assert_eq!(outcome.unmatched, 1);
    }
}
