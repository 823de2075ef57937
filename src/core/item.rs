//! Item universe: identities, display text, selection flags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable item identity. Ids run 1..=N and are never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single list entry.
///
/// `display_text` is derived from the id once at construction. `selected` is
/// the only mutable field and changes only through store operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub display_text: String,
    pub selected: bool,
}

impl Item {
    fn new(id: ItemId) -> Self {
        Self {
            id,
            display_text: format!("Item {id}"),
            selected: false,
        }
    }
}

/// The authoritative item universe.
///
/// Ids are dense (1..=N), so id lookup is index arithmetic rather than a map.
/// Items are never added or removed after generation.
#[derive(Clone, Debug)]
pub struct ItemStore {
    items: Vec<Item>,
}

impl ItemStore {
    /// Generate the universe for ids `1..=count`.
    pub fn generate(count: u64) -> Self {
        let items = (1..=count).map(|raw| Item::new(ItemId::new(raw))).collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        let raw = id.as_u64();
        if raw == 0 {
            return None;
        }
        self.items.get(raw as usize - 1)
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        let raw = id.as_u64();
        if raw == 0 {
            return None;
        }
        self.items.get_mut(raw as usize - 1)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Flip the selection flag; `None` if the id is unknown.
    pub fn toggle(&mut self, id: ItemId) -> Option<bool> {
        let item = self.get_mut(id)?;
        item.selected = !item.selected;
        Some(item.selected)
    }

    /// Replace the whole selection with exactly `ids`.
    ///
    /// Unknown ids are skipped. Returns how many ids matched the store.
    pub fn replace_selection(&mut self, ids: &[ItemId]) -> usize {
        for item in &mut self.items {
            item.selected = false;
        }
        let mut applied = 0;
        for &id in ids {
            if let Some(item) = self.get_mut(id)
                && !item.selected
            {
                item.selected = true;
                applied += 1;
            }
        }
        applied
    }

    /// Ids currently selected, in ascending id order.
    pub fn selected_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.id)
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        self.items.iter().any(|item| item.selected)
    }
}
