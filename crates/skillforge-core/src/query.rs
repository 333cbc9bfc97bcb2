//! Read-only inventory views joining the ledger with catalog metadata.

use crate::catalog::{Catalog, ItemCategory};
use crate::id::ResourceId;
use crate::ledger::InventoryLedger;
use serde::{Deserialize, Serialize};

/// One held resource with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub gold_value: u64,
    pub category: ItemCategory,
    pub quantity: u64,
    pub total_value: u64,
}

const FALLBACK_DESCRIPTION: &str = "No description available";
const FALLBACK_ICON: &str = "📦";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventorySort {
    /// By name, case-insensitive.
    #[default]
    Alphabetical,
    /// Highest unit value first.
    GoldValue,
    /// Largest stack first.
    ItemCount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryQuery {
    pub sort: InventorySort,
    /// Case-insensitive substring matched against name and description.
    pub search: Option<String>,
}

impl InventoryQuery {
    pub fn sorted(sort: InventorySort) -> Self {
        Self { sort, search: None }
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }
}

/// Every non-zero balance as an [`InventoryItem`], in ledger order.
/// Resources the catalog does not know get placeholder metadata and no value.
pub fn inventory_items(catalog: &Catalog, ledger: &InventoryLedger) -> Vec<InventoryItem> {
    ledger
        .iter()
        .map(|(id, quantity)| match catalog.resource(id.as_str()) {
            Some(def) => InventoryItem {
                id: id.clone(),
                name: def.name.clone(),
                description: def.description.clone(),
                icon: def.icon.clone(),
                gold_value: def.gold_value,
                category: def.category,
                quantity,
                total_value: def.gold_value.saturating_mul(quantity),
            },
            None => InventoryItem {
                id: id.clone(),
                name: id.to_string(),
                description: FALLBACK_DESCRIPTION.to_string(),
                icon: FALLBACK_ICON.to_string(),
                gold_value: 0,
                category: ItemCategory::Other,
                quantity,
                total_value: 0,
            },
        })
        .collect()
}

/// Filtered and sorted view. Sorting is stable.
pub fn query_inventory(
    catalog: &Catalog,
    ledger: &InventoryLedger,
    query: &InventoryQuery,
) -> Vec<InventoryItem> {
    let mut items = inventory_items(catalog, ledger);
    if let Some(search) = query.search.as_deref().map(str::trim)
        && !search.is_empty()
    {
        let needle = search.to_lowercase();
        items.retain(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.description.to_lowercase().contains(&needle)
        });
    }
    match query.sort {
        InventorySort::Alphabetical => {
            items.sort_by_cached_key(|item| item.name.to_lowercase());
        }
        InventorySort::GoldValue => items.sort_by(|a, b| b.gold_value.cmp(&a.gold_value)),
        InventorySort::ItemCount => items.sort_by(|a, b| b.quantity.cmp(&a.quantity)),
    }
    items
}

/// Combined gold value of everything held.
pub fn total_inventory_value(catalog: &Catalog, ledger: &InventoryLedger) -> u64 {
    inventory_items(catalog, ledger)
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(item.total_value))
}

/// Number of distinct resources held.
pub fn inventory_item_count(ledger: &InventoryLedger) -> usize {
    ledger.len()
}
