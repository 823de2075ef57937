//! The ordering/selection/query engine.
//!
//! `ListEngine` owns the item universe, the custom order and the persistence
//! handle, and serializes every mutation behind `&mut self`. Queries filter
//! the universe, sort with O(1) rank lookups and slice one page.
//!
//! Every mutation persists synchronously before returning success; on a
//! failed persist the in-memory change is rolled back first, so memory and
//! disk never diverge and previously-persisted state stays the durable
//! baseline.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::CoreError;
use super::item::{Item, ItemId, ItemStore};
use super::order::OrderIndex;
use crate::store::{PersistError, StateStore};

/// One page of query results.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Item>,
    pub total_count: u64,
    pub has_more: bool,
}

/// The query/selection/order engine over a fixed item universe.
pub struct ListEngine<S> {
    items: ItemStore,
    order: OrderIndex,
    store: S,
}

impl<S: StateStore> ListEngine<S> {
    /// Build the engine: generate the universe and load persisted state.
    ///
    /// Load failures are logged and treated as empty state rather than
    /// refusing to start; the blobs on disk stay untouched as the durable
    /// baseline.
    pub fn open(item_count: u64, store: S) -> Self {
        let mut items = ItemStore::generate(item_count);

        let order = match store.load_order() {
            Ok(saved) => OrderIndex::from_saved(saved),
            Err(e) => {
                warn!("failed to load saved order, starting with natural order: {e}");
                OrderIndex::new()
            }
        };

        match store.load_selected() {
            Ok(saved) if !saved.is_empty() => {
                let applied = items.replace_selection(&saved);
                debug!(saved = saved.len(), applied, "selection restored");
            }
            Ok(_) => {}
            Err(e) => warn!("failed to load saved selection, starting empty: {e}"),
        }

        info!(
            items = items.len(),
            custom_order = order.is_custom(),
            "engine ready"
        );
        Self {
            items,
            order,
            store,
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_custom_order(&self) -> bool {
        self.order.is_custom()
    }

    /// Answer one page of the filtered, effectively-ordered list.
    ///
    /// `filter` keeps items whose display text contains it as a
    /// case-insensitive substring. An out-of-range page yields an empty page,
    /// not an error.
    pub fn query(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<&str>,
    ) -> Result<Page, CoreError> {
        if page_size == 0 {
            return Err(CoreError::InvalidPageSize);
        }

        let mut matched = self.filtered(filter);
        if self.order.is_custom() {
            matched.sort_by_key(|item| self.order.sort_key(item.id));
        }

        let total = matched.len();
        let start = page as usize * page_size as usize;
        let end = total.min(start + page_size as usize);
        let items = if start >= total {
            Vec::new()
        } else {
            matched[start..end].iter().map(|item| (*item).clone()).collect()
        };

        Ok(Page {
            items,
            total_count: total as u64,
            has_more: start + (page_size as usize) < total,
        })
    }

    /// Count of the filtered set before pagination.
    ///
    /// Always equals `query(..).total_count` for the same filter.
    pub fn total_count(&self, filter: Option<&str>) -> u64 {
        match filter {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                self.items
                    .iter()
                    .filter(|item| item.display_text.to_lowercase().contains(&needle))
                    .count() as u64
            }
            _ => self.items.len() as u64,
        }
    }

    fn filtered(&self, filter: Option<&str>) -> Vec<&Item> {
        match filter {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                self.items
                    .iter()
                    .filter(|item| item.display_text.to_lowercase().contains(&needle))
                    .collect()
            }
            _ => self.items.iter().collect(),
        }
    }

    /// Flip one item's selection and persist the full selected-id list.
    pub fn toggle(&mut self, id: ItemId) -> Result<bool, CoreError> {
        let selected = self.items.toggle(id).ok_or(CoreError::NotFound(id))?;
        if let Err(e) = self.persist_selected() {
            self.items.toggle(id);
            return Err(e.into());
        }
        debug!(%id, selected, "selection toggled");
        Ok(selected)
    }

    /// Replace the whole selection in one mutation and one persist.
    ///
    /// Unknown ids are skipped: a stale client mirror must never corrupt
    /// server state. Returns how many ids matched the store.
    pub fn replace_selection(&mut self, ids: &[ItemId]) -> Result<usize, CoreError> {
        let previous = self.items.selected_ids();
        let applied = self.items.replace_selection(ids);
        if let Err(e) = self.persist_selected() {
            self.items.replace_selection(&previous);
            return Err(e.into());
        }
        debug!(submitted = ids.len(), applied, "selection replaced");
        Ok(applied)
    }

    /// All selected items, in effective order (consistent with the main list).
    pub fn selected_items(&self) -> Vec<Item> {
        let mut selected: Vec<&Item> = self.items.iter().filter(|item| item.selected).collect();
        if self.order.is_custom() {
            selected.sort_by_key(|item| self.order.sort_key(item.id));
        }
        selected.into_iter().cloned().collect()
    }

    pub fn has_selection(&self) -> bool {
        self.items.has_selection()
    }

    /// Install a complete new order, wholesale.
    ///
    /// An empty payload is rejected; clearing goes through
    /// [`ListEngine::reset_order`]. A payload submitted from a filtered or
    /// paginated view fixes only the visible ids' relative order; ids outside
    /// that window keep their old ranks and interleave by the natural-order
    /// fallback. Known scoping limitation of partial-view reordering.
    pub fn replace_order(&mut self, new_order: Vec<ItemId>) -> Result<(), CoreError> {
        if new_order.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        let previous = self.order.to_vec();
        self.order.replace(new_order);
        if let Err(e) = self.store.save_order(self.order.as_slice()) {
            self.order = OrderIndex::from_saved(previous);
            return Err(e.into());
        }
        info!(len = self.order.len(), "custom order replaced");
        Ok(())
    }

    /// Drop the custom order; effective order reverts to natural id order.
    pub fn reset_order(&mut self) -> Result<(), CoreError> {
        let previous = self.order.to_vec();
        self.order.clear();
        if let Err(e) = self.store.save_order(&[]) {
            self.order = OrderIndex::from_saved(previous);
            return Err(e.into());
        }
        info!("custom order reset");
        Ok(())
    }

    /// Defensive copy of the current custom order (empty when natural order
    /// is in effect). Diagnostics and bootstrapping only.
    pub fn current_order(&self) -> Vec<ItemId> {
        self.order.to_vec()
    }

    /// Persist both blobs once more; called on orderly shutdown.
    pub fn flush(&mut self) -> Result<(), CoreError> {
        self.store.save_order(self.order.as_slice())?;
        self.persist_selected()?;
        Ok(())
    }

    fn persist_selected(&mut self) -> Result<(), PersistError> {
        let selected = self.items.selected_ids();
        self.store.save_selected(&selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStore;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    #[test]
    fn open_restores_persisted_state() {
        let store = MemoryStateStore::with_state(ids(&[4, 2]), ids(&[3, 99]));
        let engine = ListEngine::open(5, store);

        assert!(engine.is_custom_order());
        assert_eq!(engine.current_order(), ids(&[4, 2]));
        // Unknown id 99 in the saved selection is skipped.
        let selected: Vec<u64> = engine
            .selected_items()
            .iter()
            .map(|item| item.id.as_u64())
            .collect();
        assert_eq!(selected, vec![3]);
    }

    #[test]
    fn reorder_payload_is_deduplicated() {
        let mut engine = ListEngine::open(5, MemoryStateStore::new());
        engine.replace_order(ids(&[2, 2, 1])).unwrap();
        assert_eq!(engine.current_order(), ids(&[2, 1]));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let engine = ListEngine::open(5, MemoryStateStore::new());
        assert!(matches!(
            engine.query(0, 0, None),
            Err(CoreError::InvalidPageSize)
        ));
    }
}
