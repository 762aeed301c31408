use crate::id::{EntityId, ItemId};
use serde::{Deserialize, Serialize};

pub type ChecklistId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub order_index: f64,
}

impl ChecklistItem {
    /// Item created locally and not yet known to the remote service.
    pub fn temporary(text: String, order_index: f64) -> Self {
        Self {
            id: EntityId::temporary(),
            text,
            completed: false,
            order_index,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Builds a checklist with items in ascending order-index order.
    pub fn new(id: ChecklistId, title: String, mut items: Vec<ChecklistItem>) -> Self {
        items.sort_by(|a, b| a.order_index.total_cmp(&b.order_index));
        Self { id, title, items }
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    /// Number of items that already exist remotely.
    pub fn confirmed_len(&self) -> usize {
        self.items.iter().filter(|item| !item.is_temporary()).count()
    }

    pub fn with_item_appended(&self, item: ChecklistItem) -> Self {
        let mut items = self.items.clone();
        items.push(item);
        Self {
            items,
            ..self.clone()
        }
    }

    /// Puts an item back at `index`; past the end appends.
    pub fn with_item_inserted(&self, index: usize, item: ChecklistItem) -> Self {
        let mut items = self.items.clone();
        items.insert(index.min(items.len()), item);
        Self {
            items,
            ..self.clone()
        }
    }

    pub fn without_item(&self, item_id: &ItemId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| &item.id != item_id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Replaces the item with `item_id`, keeping its position.
    pub fn with_item_replaced(&self, item_id: &ItemId, replacement: ChecklistItem) -> Self {
        Self {
            items: self
                .items
                .iter()
                .map(|item| {
                    if &item.id == item_id {
                        replacement.clone()
                    } else {
                        item.clone()
                    }
                })
                .collect(),
            ..self.clone()
        }
    }
}
