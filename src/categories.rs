//! Category tree builder
//!
//! `GetCategories` returns a flat list of categories tagged with a one-indexed
//! level and a parent id. The builder links that list into a rooted forest
//! with deterministic sibling ordering, which is then handed to the category
//! cache as an immutable snapshot.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parent id carried by root-level categories
pub const ROOT_PARENT_ID: &str = "0";

/// One flat category entry from a `GetCategories` response
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "CategoryID")]
    pub id: String,
    #[serde(rename = "CategoryName")]
    pub name: String,
    /// One-indexed depth; the Trading API serializes this as a string
    #[serde(rename = "CategoryLevel", deserialize_with = "de_level")]
    pub level: u32,
    #[serde(rename = "CategoryParentID", default = "root_parent")]
    pub parent_id: String,
}

fn root_parent() -> String {
    ROOT_PARENT_ID.to_string()
}

/// Accept the level as either a JSON number or a decimal string
fn de_level<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as u32)
            .ok_or_else(|| serde::de::Error::custom("category level is not an integer")),
        Value::String(s) => s
            .parse()
            .map_err(|_| serde::de::Error::custom("category level is not an integer")),
        _ => Err(serde::de::Error::custom(
            "category level must be a number or string",
        )),
    }
}

/// A category with its children linked in, sorted ascending by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub parent_id: String,
    pub children: Vec<CategoryNode>,
    /// Allowed listing conditions; populated by consumers joining the
    /// feature dataset, empty straight out of the builder.
    #[serde(default)]
    pub condition_values: Vec<Value>,
    #[serde(default)]
    pub condition_help_url: Option<String>,
}

impl From<CategoryRecord> for CategoryNode {
    fn from(record: CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            level: record.level,
            parent_id: record.parent_id,
            children: Vec::new(),
            condition_values: Vec::new(),
            condition_help_url: None,
        }
    }
}

/// The linked category forest
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTree {
    /// Level-1 categories, sorted ascending by name
    pub top_level: Vec<CategoryNode>,
    pub max_level: u32,
}

/// Deserialize the `CategoryArray.Category` entries of a `GetCategories`
/// response into flat records.
pub fn parse_category_records(entries: &[Value]) -> Result<Vec<CategoryRecord>> {
    entries
        .iter()
        .map(|entry| serde_json::from_value(entry.clone()).map_err(SyncError::Parse))
        .collect()
}

/// Link a flat leveled category list into a forest.
///
/// Uses one map per level (index 0 unused, levels are one-indexed) and links
/// each level's nodes to their parents one level up. A category whose parent
/// does not exist in the shallower level is a fatal inconsistency; the run
/// aborts rather than silently dropping the orphan. Linking runs deepest
/// level first so every child list is complete before its node is moved into
/// its own parent.
pub fn build_category_tree(records: Vec<CategoryRecord>) -> Result<CategoryTree> {
    let mut levels: Vec<BTreeMap<String, CategoryNode>> = Vec::new();
    for record in records {
        if record.level < 1 {
            return Err(SyncError::MalformedResponse(format!(
                "category {} has level {}",
                record.id, record.level
            )));
        }
        let level = record.level as usize;
        while levels.len() <= level {
            levels.push(BTreeMap::new());
        }
        levels[level].insert(record.id.clone(), CategoryNode::from(record));
    }

    let max_level = levels.len().saturating_sub(1) as u32;

    for level in (2..levels.len()).rev() {
        let nodes = std::mem::take(&mut levels[level]);
        for (_, node) in nodes {
            match levels[level - 1].get_mut(&node.parent_id) {
                Some(parent) => parent.children.push(node),
                None => {
                    return Err(SyncError::MissingParent {
                        category_id: node.id,
                        parent_id: node.parent_id,
                        level: node.level,
                    })
                }
            }
        }
    }

    let mut top_level: Vec<CategoryNode> = match levels.get_mut(1) {
        Some(roots) => std::mem::take(roots).into_values().collect(),
        None => Vec::new(),
    };
    for node in &mut top_level {
        sort_children(node);
    }
    top_level.sort_by(|a, b| a.name.cmp(&b.name));

    log::info!(
        "Built category tree: {} top-level categories, max level {}",
        top_level.len(),
        max_level
    );
    Ok(CategoryTree {
        top_level,
        max_level,
    })
}

/// Sort every child list ascending by name, case-sensitive
fn sort_children(node: &mut CategoryNode) {
    node.children.sort_by(|a, b| a.name.cmp(&b.name));
    for child in &mut node.children {
        sort_children(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, level: u32, parent: &str) -> CategoryRecord {
        CategoryRecord {
            id: id.to_string(),
            name: name.to_string(),
            level,
            parent_id: parent.to_string(),
        }
    }

    fn sample_records() -> Vec<CategoryRecord> {
        vec![
            record("10", "Books", 1, "0"),
            record("20", "Art", 1, "0"),
            record("11", "Fiction", 2, "10"),
            record("12", "Biography", 2, "10"),
            record("13", "Zoology", 3, "12"),
        ]
    }

    #[test]
    fn links_children_to_parents_one_level_up() {
        let tree = build_category_tree(sample_records()).unwrap();
        assert_eq!(tree.max_level, 3);

        let books = tree.top_level.iter().find(|n| n.id == "10").unwrap();
        assert_eq!(books.children.len(), 2);
        for child in &books.children {
            assert_eq!(child.level, books.level + 1);
            assert_eq!(child.parent_id, books.id);
        }

        let biography = books.children.iter().find(|n| n.id == "12").unwrap();
        assert_eq!(biography.children.len(), 1);
        assert_eq!(biography.children[0].id, "13");
    }

    #[test]
    fn siblings_sorted_ascending_by_name() {
        let tree = build_category_tree(sample_records()).unwrap();
        let top_names: Vec<&str> = tree.top_level.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(top_names, vec!["Art", "Books"]);

        let books = &tree.top_level[1];
        let child_names: Vec<&str> = books.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(child_names, vec!["Biography", "Fiction"]);
    }

    #[test]
    fn sort_is_case_sensitive() {
        let records = vec![
            record("1", "apples", 1, "0"),
            record("2", "Bananas", 1, "0"),
        ];
        let tree = build_category_tree(records).unwrap();
        // Uppercase sorts before lowercase under default string ordering
        assert_eq!(tree.top_level[0].name, "Bananas");
    }

    #[test]
    fn permuted_input_yields_identical_tree() {
        let mut reversed = sample_records();
        reversed.reverse();

        let a = build_category_tree(sample_records()).unwrap();
        let b = build_category_tree(reversed).unwrap();
        assert_eq!(
            serde_json::to_value(&a.top_level).unwrap(),
            serde_json::to_value(&b.top_level).unwrap()
        );
    }

    #[test]
    fn missing_parent_is_fatal() {
        let records = vec![
            record("10", "Books", 1, "0"),
            record("99", "Orphan", 2, "404"),
        ];
        let err = build_category_tree(records).unwrap_err();
        match err {
            SyncError::MissingParent {
                category_id,
                parent_id,
                level,
            } => {
                assert_eq!(category_id, "99");
                assert_eq!(parent_id, "404");
                assert_eq!(level, 2);
            }
            other => panic!("expected MissingParent, got {}", other),
        }
    }

    #[test]
    fn empty_input_builds_empty_tree() {
        let tree = build_category_tree(Vec::new()).unwrap();
        assert!(tree.top_level.is_empty());
        assert_eq!(tree.max_level, 0);
    }

    #[test]
    fn parses_records_with_string_levels() {
        let entries = vec![serde_json::json!({
            "CategoryID": "550",
            "CategoryName": "Art",
            "CategoryLevel": "1",
            "CategoryParentID": "0"
        })];
        let records = parse_category_records(&entries).unwrap();
        assert_eq!(records[0].level, 1);
        assert_eq!(records[0].parent_id, "0");
    }
}
