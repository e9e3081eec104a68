//! Emergency supply inventory.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::documents;
use crate::storage::{DocumentKey, DocumentStore};

/// Months before expiry at which an item is flagged.
const WARNING_MONTHS: i32 = 3;

/// Kind of supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Food and water.
    Food,
    /// Medical supplies.
    Medical,
    /// Tools and equipment.
    Tool,
    /// Documents and copies of documents.
    Doc,
}

impl ItemCategory {
    /// Every category.
    pub const ALL: [Self; 4] = [Self::Food, Self::Medical, Self::Tool, Self::Doc];

    /// Identifier used in stored documents and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Medical => "medical",
            Self::Tool => "tool",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_input(format!("unknown item category: {s}")))
    }
}

/// A stocked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Unique id.
    pub id: String,
    /// What it is.
    pub name: String,
    /// Kind of supply.
    pub category: ItemCategory,
    /// Best-before or expiry date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    /// How many are stocked.
    pub quantity: u32,
    /// Where it is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Freshness of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// No expiry date, or more than a few months left.
    Normal,
    /// Expires within the next few months.
    Warning,
    /// Past its expiry month.
    Expired,
}

/// Freshness of `item` on `today`, by calendar month.
#[must_use]
pub fn expiry_status(item: &InventoryItem, today: NaiveDate) -> ExpiryStatus {
    let Some(expiry) = item.expiry_date else {
        return ExpiryStatus::Normal;
    };
    #[allow(clippy::cast_possible_wrap)]
    let months =
        (expiry.year() - today.year()) * 12 + (expiry.month() as i32 - today.month() as i32);
    if months < 0 {
        ExpiryStatus::Expired
    } else if months < WARNING_MONTHS {
        ExpiryStatus::Warning
    } else {
        ExpiryStatus::Normal
    }
}

/// A new item to stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// What it is.
    pub name: String,
    /// Kind of supply.
    pub category: ItemCategory,
    /// How many.
    pub quantity: u32,
    /// Expiry date, if any.
    pub expiry_date: Option<NaiveDate>,
    /// Where it is kept.
    pub location: Option<String>,
}

impl NewItem {
    /// A single item of `category` with no expiry or location.
    pub fn new(name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            name: name.into(),
            category,
            quantity: 1,
            expiry_date: None,
            location: None,
        }
    }
}

/// The items a fresh install starts with.
#[must_use]
pub fn default_items() -> Vec<InventoryItem> {
    let item = |id: &str, name: &str, quantity, category, expiry: Option<(i32, u32, u32)>| {
        InventoryItem {
            id: id.to_string(),
            name: name.to_string(),
            category,
            expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            quantity,
            location: None,
        }
    };

    vec![
        item("1", "Drinking water (500 ml)", 12, ItemCategory::Food, Some((2025, 12, 1))),
        item("2", "Compressed biscuits", 10, ItemCategory::Food, Some((2026, 5, 1))),
        item("3", "Adhesive bandages", 20, ItemCategory::Medical, Some((2027, 1, 1))),
        item("4", "Iodine swabs", 1, ItemCategory::Medical, None),
        item("5", "Hand-crank flashlight", 1, ItemCategory::Tool, None),
    ]
}

/// The stored supply list.
#[derive(Debug)]
pub struct Inventory<S: DocumentStore> {
    store: S,
    items: Vec<InventoryItem>,
}

impl<S: DocumentStore> Inventory<S> {
    /// Load the inventory, seeding example items when nothing usable is stored.
    pub fn open(store: S) -> Self {
        let (items, source) =
            documents::load_with_source(&store, DocumentKey::Inventory, default_items);
        let inventory = Self { store, items };
        if source.is_fallback() {
            info!(count = inventory.items.len(), "Seeded example inventory");
            inventory.persist();
        }
        inventory
    }

    /// Every item, in stored order.
    #[must_use]
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Items of `category`, or all items.
    #[must_use]
    pub fn filter(&self, category: Option<ItemCategory>) -> Vec<&InventoryItem> {
        self.items
            .iter()
            .filter(|i| category.map_or(true, |c| i.category == c))
            .collect()
    }

    /// Items that are expired or close to expiry on `today`.
    #[must_use]
    pub fn needs_attention(&self, today: NaiveDate) -> Vec<(&InventoryItem, ExpiryStatus)> {
        self.items
            .iter()
            .map(|i| (i, expiry_status(i, today)))
            .filter(|(_, status)| *status != ExpiryStatus::Normal)
            .collect()
    }

    /// Stock a new item. Blank names are ignored.
    pub fn add(&mut self, new: NewItem) -> Option<&InventoryItem> {
        let name = new.name.trim();
        if name.is_empty() {
            return None;
        }
        let item = InventoryItem {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            category: new.category,
            expiry_date: new.expiry_date,
            quantity: new.quantity,
            location: new.location.filter(|l| !l.trim().is_empty()),
        };
        debug!(id = %item.id, name = %item.name, "Added inventory item");
        self.items.push(item);
        self.persist();
        self.items.last()
    }

    /// Remove item `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Give back the store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&self) {
        documents::save(&self.store, DocumentKey::Inventory, &self.items);
    }
}
