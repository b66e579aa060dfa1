//! Walking the nested local catalog.
//!
//! Both the `Items` and the `Shop` sections are trees of dictionaries whose
//! leaves are arrays of item records, at uneven depths. One walker serves both:
//! flattening collects full records, the shop index collects ids only.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use super::entities::{synthetic_name, CatalogItem, ItemId, SkillBoost};
use super::error::InputError;

const ITEMS_KEY: &str = "Items";
const SHOP_KEY: &str = "Shop";
const REFERENCES_KEY: &str = "References";
const CATEGORY_SEPARATOR: &str = "_";

/// The local catalog exactly as loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct RawCatalog(Value);

impl RawCatalog {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Root of the item tree. Its absence means the input is not a catalog at all.
    pub fn items_root(&self) -> Result<&Map<String, Value>, InputError> {
        self.0
            .get(ITEMS_KEY)
            .and_then(Value::as_object)
            .ok_or(InputError::MissingItemsRoot)
    }

    pub fn shop_root(&self) -> Option<&Map<String, Value>> {
        self.0.get(SHOP_KEY).and_then(Value::as_object)
    }

    /// Display name for a category id via `References.categories`, or the id itself.
    pub fn category_name(&self, category: &str) -> String {
        self.0
            .get(REFERENCES_KEY)
            .and_then(|refs| refs.get("categories"))
            .and_then(|names| names.get(category))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| category.to_string())
    }
}

impl From<Value> for RawCatalog {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// How a value inside the tree is treated by the walker.
enum TreeNode<'a> {
    /// An array; its object elements are item records.
    Records(&'a [Value]),
    /// A dictionary of further subtrees.
    Branch(&'a Map<String, Value>),
    /// Anything else (scalars, null) is ignored.
    Ignored,
}

impl<'a> TreeNode<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(records) => TreeNode::Records(records),
            Value::Object(branch) => TreeNode::Branch(branch),
            _ => TreeNode::Ignored,
        }
    }
}

/// Visits every object record found in any array under `root`, depth first in
/// key order. `visit` receives the key path from `root` to the record's array.
pub fn walk_tree<'a, F>(root: &'a Map<String, Value>, mut visit: F)
where
    F: FnMut(&[&'a str], &'a Map<String, Value>),
{
    let mut path = Vec::new();
    walk_branch(root, &mut path, &mut visit);
}

fn walk_branch<'a, F>(branch: &'a Map<String, Value>, path: &mut Vec<&'a str>, visit: &mut F)
where
    F: FnMut(&[&'a str], &'a Map<String, Value>),
{
    for (key, child) in branch {
        path.push(key.as_str());
        match TreeNode::classify(child) {
            TreeNode::Records(records) => {
                for record in records.iter().filter_map(Value::as_object) {
                    visit(path.as_slice(), record);
                }
            }
            TreeNode::Branch(sub) => walk_branch(sub, path, visit),
            TreeNode::Ignored => {}
        }
        path.pop();
    }
}

/// Integer id of a record, if it has one.
fn record_id(record: &Map<String, Value>) -> Option<ItemId> {
    let id = record.get("id")?;
    id.as_i64().or_else(|| {
        id.as_f64()
            .filter(|value| value.fract() == 0.0 && value.is_finite())
            .map(|value| value as ItemId)
    })
}

fn catalog_item(id: ItemId, record: &Map<String, Value>, path: &[&str]) -> CatalogItem {
    let name = record
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| synthetic_name(id));

    let base_value = record
        .get("value")
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(0.0);

    let category = if path.is_empty() {
        "unknown".to_string()
    } else {
        path.join(CATEGORY_SEPARATOR)
    };

    CatalogItem {
        id,
        name,
        base_value,
        category,
        skill: record.get("skill").and_then(Value::as_i64),
        slot: record.get("slot").and_then(Value::as_i64),
        skill_boost: record
            .get("skillBoost")
            .and_then(|boost| serde_json::from_value::<SkillBoost>(boost.clone()).ok()),
    }
}

/// Flattens the `Items` tree. The first record seen for an id wins.
pub fn flatten_catalog(catalog: &RawCatalog) -> Result<Vec<CatalogItem>, InputError> {
    let root = catalog.items_root()?;
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let mut skipped = 0_usize;

    walk_tree(root, |path, record| {
        let Some(id) = record_id(record) else {
            skipped += 1;
            return;
        };
        if seen.insert(id) {
            items.push(catalog_item(id, record, path));
        }
    });

    if skipped > 0 {
        tracing::debug!("[catalog] skipped {skipped} records without an id");
    }
    tracing::debug!("[catalog] flattened {} items", items.len());

    Ok(items)
}

/// Every id found anywhere in the `Shop` tree. An absent shop yields an empty set.
pub fn shop_exclusion_ids(catalog: &RawCatalog) -> HashSet<ItemId> {
    let mut ids = HashSet::new();
    if let Some(root) = catalog.shop_root() {
        walk_tree(root, |_, record| {
            if let Some(id) = record_id(record) {
                ids.insert(id);
            }
        });
    }
    ids
}

/// Flattened catalog plus shop exclusions, built once and shared by both reconcilers.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    items: Vec<CatalogItem>,
    positions: HashMap<ItemId, usize>,
    shop_ids: HashSet<ItemId>,
}

impl CatalogIndex {
    pub fn build(catalog: &RawCatalog) -> Result<Self, InputError> {
        let items = flatten_catalog(catalog)?;
        let shop_ids = shop_exclusion_ids(catalog);
        let positions = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect();

        tracing::info!(
            "[catalog] indexed {} items, {} shop exclusions",
            items.len(),
            shop_ids.len()
        );

        Ok(Self {
            items,
            positions,
            shop_ids,
        })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&CatalogItem> {
        self.positions.get(&id).map(|&position| &self.items[position])
    }

    pub fn is_shop_item(&self, id: ItemId) -> bool {
        self.shop_ids.contains(&id)
    }

    pub fn shop_ids(&self) -> &HashSet<ItemId> {
        &self.shop_ids
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RawCatalog {
        RawCatalog::new(json!({
            "Items": {
                "ores": [
                    { "id": 1, "name": "copper_ore", "value": 5 },
                    { "id": 2, "value": 8 }
                ],
                "weapons": {
                    "melee": {
                        "longswords": [
                            { "id": 10, "name": "bronze_longsword", "value": 120, "skill": 3, "slot": 1 }
                        ]
                    },
                    "bows": [
                        { "id": 11, "name": "normal_bow", "value": 60,
                          "skillBoost": { "skill": 4, "percentage": 2.5 } }
                    ]
                },
                "misc": [
                    null,
                    42,
                    { "name": "no_id" },
                    { "id": 1, "name": "copper_ore_again", "value": 999 }
                ],
                "notes": "not a tree"
            },
            "Shop": {
                "general": [ { "id": 2 }, { "name": "nameless" } ],
                "smithing": { "bars": { "deep": [ { "id": 10 } ] } }
            },
            "References": { "categories": { "ores": "Ores & Gems" } }
        }))
    }

    #[test]
    fn flattens_every_depth_with_key_paths() {
        let items = flatten_catalog(&sample()).unwrap();
        let summary: Vec<(ItemId, &str)> = items
            .iter()
            .map(|item| (item.id, item.category.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (1, "ores"),
                (2, "ores"),
                (10, "weapons_melee_longswords"),
                (11, "weapons_bows"),
            ]
        );
    }

    #[test]
    fn first_occurrence_wins_on_duplicate_ids() {
        let items = flatten_catalog(&sample()).unwrap();
        let copper = items.iter().find(|item| item.id == 1).unwrap();
        assert_eq!(copper.name, "copper_ore");
        assert_eq!(copper.base_value, 5.0);
    }

    #[test]
    fn fills_missing_names_and_passes_metadata_through() {
        let items = flatten_catalog(&sample()).unwrap();
        assert_eq!(items[1].name, "item_2");

        let sword = &items[2];
        assert_eq!(sword.skill, Some(3));
        assert_eq!(sword.slot, Some(1));

        let bow = &items[3];
        assert_eq!(
            bow.skill_boost,
            Some(SkillBoost {
                skill: 4,
                percentage: 2.5
            })
        );
    }

    #[test]
    fn flattening_is_repeatable() {
        let catalog = sample();
        assert_eq!(
            flatten_catalog(&catalog).unwrap(),
            flatten_catalog(&catalog).unwrap()
        );
    }

    #[test]
    fn missing_items_root_is_an_error() {
        let catalog = RawCatalog::new(json!({ "Shop": {} }));
        assert_eq!(
            flatten_catalog(&catalog).unwrap_err(),
            InputError::MissingItemsRoot
        );

        let catalog = RawCatalog::new(json!({ "Items": [ { "id": 1 } ] }));
        assert!(CatalogIndex::build(&catalog).is_err());
    }

    #[test]
    fn shop_ids_collected_at_any_depth() {
        let ids = shop_exclusion_ids(&sample());
        assert_eq!(ids, HashSet::from([2, 10]));
    }

    #[test]
    fn absent_shop_gives_no_exclusions() {
        let catalog = RawCatalog::new(json!({ "Items": { "ores": [ { "id": 1 } ] } }));
        assert!(shop_exclusion_ids(&catalog).is_empty());
    }

    #[test]
    fn index_lookups() {
        let index = CatalogIndex::build(&sample()).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.get(11).map(|item| item.name.as_str()), Some("normal_bow"));
        assert!(index.get(99).is_none());
        assert!(index.is_shop_item(10));
        assert!(!index.is_shop_item(1));
    }

    #[test]
    fn category_names_resolve_through_references() {
        let catalog = sample();
        assert_eq!(catalog.category_name("ores"), "Ores & Gems");
        assert_eq!(catalog.category_name("weapons_bows"), "weapons_bows");
    }
}
