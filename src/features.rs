//! Category feature aggregation
//!
//! `GetCategoryFeatures` cannot be fetched in one call at marketplace scale,
//! so the aggregator queries one top-level category at a time and merges the
//! partial responses into a single dataset. Categories in the configured
//! split set are known to time out when queried whole; their immediate
//! children are queried instead and the flagged parent itself is queried last
//! with its depth limited to its own level.

use crate::categories::CategoryTree;
use crate::error::{Result, SyncError};
use crate::trading::{as_sequence, str_field, TradingApi};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// The feature-definition key that gets promoted to its own field
const LISTING_DURATIONS_KEY: &str = "ListingDurations";

/// Merged category feature data for one site
#[derive(Debug, Serialize)]
pub struct FeatureDataset {
    /// Per-category feature entries, appended across calls. Duplicate ids
    /// across calls are tolerated; downstream consumers resolve them.
    pub categories: Vec<Value>,
    /// Names of every feature definition seen, minus `ListingDurations`
    pub feature_definitions: BTreeSet<String>,
    /// Duration-set id -> duration codes, first seen wins
    pub listing_durations: BTreeMap<String, Vec<String>>,
    pub listing_durations_version: Option<String>,
    pub site_defaults: Option<Value>,
    pub version: String,
}

/// Aggregate category features for every top-level category of the tree.
///
/// Any transport failure aborts the whole aggregation; no partial dataset is
/// returned.
pub fn aggregate_features<A: TradingApi>(
    api: &A,
    tree: &CategoryTree,
    split_categories: &HashSet<String>,
) -> Result<FeatureDataset> {
    let mut search: Vec<(String, u32)> = Vec::new();
    let mut flagged: Vec<(String, u32)> = Vec::new();
    for category in &tree.top_level {
        if split_categories.contains(&category.id) {
            for child in &category.children {
                search.push((child.id.clone(), child.level));
            }
            flagged.push((category.id.clone(), category.level));
        } else {
            search.push((category.id.clone(), category.level));
        }
    }
    // Flagged parents go to the end of the list, depth-limited below
    search.extend(flagged);

    let mut dataset: Option<FeatureDataset> = None;

    for (category_id, level) in &search {
        let sub = "sub".repeat((*level as usize).saturating_sub(1));
        log::info!("Loading features for {}category {}...", sub, category_id);

        let mut params = json!({
            "CategoryID": category_id,
            "DetailLevel": "ReturnAll",
            "ViewAllNodes": true,
        });
        if split_categories.contains(category_id) {
            params["LevelLimit"] = json!(1);
        }

        let response = api.execute("GetCategoryFeatures", &params)?;

        match dataset.as_mut() {
            None => {
                // First response seeds the aggregate wholesale
                let mut seeded = FeatureDataset {
                    categories: as_sequence(response.get("Category").unwrap_or(&Value::Null)),
                    feature_definitions: BTreeSet::new(),
                    listing_durations: BTreeMap::new(),
                    listing_durations_version: None,
                    site_defaults: response.get("SiteDefaults").cloned(),
                    version: str_field(&response, "CategoryVersion")
                        .unwrap_or_default()
                        .to_string(),
                };
                if let Some(definitions) = response.get("FeatureDefinitions") {
                    merge_definitions(&mut seeded, definitions);
                }
                dataset = Some(seeded);
            }
            Some(aggregate) => {
                let Some(categories) = response.get("Category") else {
                    // No over-ridden categories returned for this id
                    continue;
                };
                aggregate.categories.extend(as_sequence(categories));
                if let Some(definitions) = response.get("FeatureDefinitions") {
                    merge_definitions(aggregate, definitions);
                }
            }
        }
    }

    let mut dataset = dataset.ok_or_else(|| {
        SyncError::MalformedResponse("no categories to aggregate features for".to_string())
    })?;

    // ListingDurations has been promoted to its own field
    dataset.feature_definitions.remove(LISTING_DURATIONS_KEY);
    for category in &mut dataset.categories {
        flatten_conditions(category);
    }
    if let Some(defaults) = dataset.site_defaults.as_mut() {
        flatten_conditions(defaults);
    }

    log::info!(
        "Aggregated features: {} category entries, {} definitions, {} duration sets",
        dataset.categories.len(),
        dataset.feature_definitions.len(),
        dataset.listing_durations.len()
    );
    Ok(dataset)
}

/// Union a response's feature-definition keys and listing durations into the
/// aggregate. Duration sets already present keep their first-seen value.
fn merge_definitions(dataset: &mut FeatureDataset, definitions: &Value) {
    let Some(map) = definitions.as_object() else {
        return;
    };
    for key in map.keys() {
        dataset.feature_definitions.insert(key.clone());
    }

    let Some(durations) = map.get(LISTING_DURATIONS_KEY) else {
        return;
    };
    if dataset.listing_durations_version.is_none() {
        dataset.listing_durations_version = str_field(durations, "_Version").map(str::to_string);
    }
    for entry in as_sequence(durations.get("ListingDuration").unwrap_or(&Value::Null)) {
        let set_id = match entry.get("_durationSetID") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        if dataset.listing_durations.contains_key(&set_id) {
            continue;
        }
        let codes = as_sequence(entry.get("Duration").unwrap_or(&Value::Null))
            .iter()
            .filter_map(|code| code.as_str().map(str::to_string))
            .collect();
        dataset.listing_durations.insert(set_id, codes);
    }
}

/// Move an optional `ConditionHelpURL` out of a `ConditionValues` wrapper and
/// replace the wrapper with the flattened condition list it carried.
fn flatten_conditions(entry: &mut Value) {
    let Some(object) = entry.as_object_mut() else {
        return;
    };
    let Some(mut wrapper) = object.remove("ConditionValues") else {
        return;
    };
    match wrapper.as_object_mut() {
        Some(values) => {
            if let Some(url) = values.remove("ConditionHelpURL") {
                object.insert("ConditionHelpURL".to_string(), url);
            }
            let conditions = values.remove("Condition").unwrap_or(Value::Null);
            object.insert(
                "ConditionValues".to_string(),
                Value::Array(as_sequence(&conditions)),
            );
        }
        None => {
            object.insert("ConditionValues".to_string(), wrapper);
        }
    }
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod tests;
