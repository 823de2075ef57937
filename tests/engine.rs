//! Engine-level properties: pagination, counts, ordering, selection,
//! persistence rollback.

use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;

use lineup::core::{CoreError, ItemId, ListEngine};
use lineup::store::{JsonStateStore, MemoryStateStore, PersistError, StateStore};

fn ids(raw: &[u64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::new).collect()
}

fn engine(n: u64) -> ListEngine<MemoryStateStore> {
    ListEngine::open(n, MemoryStateStore::new())
}

fn page_ids<S: StateStore>(engine: &ListEngine<S>, page: u32, size: u32, filter: Option<&str>) -> Vec<u64> {
    engine
        .query(page, size, filter)
        .unwrap()
        .items
        .iter()
        .map(|item| item.id.as_u64())
        .collect()
}

/// Concatenate every page and compare against a single full-size query.
fn paginate_all<S: StateStore>(engine: &ListEngine<S>, size: u32, filter: Option<&str>) -> Vec<u64> {
    let mut all = Vec::new();
    let mut page = 0;
    loop {
        let result = engine.query(page, size, filter).unwrap();
        let last = !result.has_more;
        all.extend(result.items.iter().map(|item| item.id.as_u64()));
        if last {
            // Past-the-end pages are empty, not an error.
            let past = engine.query(page + 1, size, filter).unwrap();
            assert!(past.items.is_empty());
            assert!(!past.has_more);
            return all;
        }
        page += 1;
    }
}

#[test]
fn pages_concatenate_without_overlap_or_gap() {
    let engine = engine(95);

    let all = paginate_all(&engine, 10, None);
    let expected: Vec<u64> = (1..=95).collect();
    assert_eq!(all, expected);
}

#[test]
fn pages_concatenate_under_custom_order_and_filter() {
    let mut engine = engine(95);
    engine.replace_order(ids(&[50, 10, 30])).unwrap();

    let all = paginate_all(&engine, 10, None);
    let full = page_ids(&engine, 0, 95, None);
    assert_eq!(all, full);
    assert_eq!(&all[..3], &[50, 10, 30]);

    let filtered = paginate_all(&engine, 7, Some("9"));
    let full = page_ids(&engine, 0, 95, Some("9"));
    assert_eq!(filtered, full);
}

#[test]
fn has_more_is_false_exactly_on_the_last_page() {
    let engine = engine(20);

    let exact = engine.query(0, 20, None).unwrap();
    assert!(!exact.has_more);
    assert_eq!(exact.items.len(), 20);

    let partial = engine.query(1, 15, None).unwrap();
    assert_eq!(partial.items.len(), 5);
    assert!(!partial.has_more);

    let first = engine.query(0, 15, None).unwrap();
    assert!(first.has_more);
}

#[test]
fn total_count_matches_filtered_length() {
    let engine = engine(300);

    for filter in [None, Some(""), Some("42"), Some("item"), Some("nope")] {
        let full = engine.query(0, 300, filter).unwrap();
        assert_eq!(
            engine.total_count(filter),
            full.items.len() as u64,
            "filter {filter:?}"
        );
        assert_eq!(engine.total_count(filter), full.total_count);
    }
}

#[test]
fn search_is_case_insensitive_substring_containment() {
    let engine = engine(500);

    let result = engine.query(0, 500, Some("42")).unwrap();
    let got: Vec<u64> = result.items.iter().map(|item| item.id.as_u64()).collect();
    let expected: Vec<u64> = (1..=500u64)
        .filter(|id| format!("Item {id}").contains("42"))
        .collect();
    assert_eq!(got, expected);
    assert_eq!(result.total_count, expected.len() as u64);

    // "ITEM" matches everything despite the case difference.
    assert_eq!(engine.total_count(Some("ITEM")), 500);
}

#[test]
fn replace_order_puts_ranked_ids_first_then_natural_order() {
    let mut engine = engine(5);

    engine.replace_order(ids(&[3, 1])).unwrap();
    assert_eq!(page_ids(&engine, 0, 5, None), vec![3, 1, 2, 4, 5]);

    engine.toggle(ItemId::new(2)).unwrap();
    let selected: Vec<u64> = engine
        .selected_items()
        .iter()
        .map(|item| item.id.as_u64())
        .collect();
    assert_eq!(selected, vec![2]);

    engine.reset_order().unwrap();
    assert_eq!(page_ids(&engine, 0, 5, None), vec![1, 2, 3, 4, 5]);
}

#[test]
fn reset_restores_natural_order_regardless_of_history() {
    let mut engine = engine(10);

    engine.replace_order(ids(&[9, 8, 7])).unwrap();
    engine.replace_order(ids(&[2, 4])).unwrap();
    engine.reset_order().unwrap();

    assert!(!engine.is_custom_order());
    assert!(engine.current_order().is_empty());
    assert_eq!(page_ids(&engine, 0, 10, None), (1..=10).collect::<Vec<_>>());
}

#[test]
fn toggle_is_its_own_inverse() {
    let mut engine = engine(5);

    assert!(engine.toggle(ItemId::new(3)).unwrap());
    assert!(!engine.toggle(ItemId::new(3)).unwrap());
    assert!(!engine.has_selection());

    let err = engine.toggle(ItemId::new(6)).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn selected_items_follow_effective_order() {
    let mut engine = engine(5);
    for id in [1, 2, 4] {
        engine.toggle(ItemId::new(id)).unwrap();
    }
    engine.replace_order(ids(&[4, 2])).unwrap();

    let selected: Vec<u64> = engine
        .selected_items()
        .iter()
        .map(|item| item.id.as_u64())
        .collect();
    assert_eq!(selected, vec![4, 2, 1]);
}

#[test]
fn replace_selection_is_one_mutation() {
    let mut engine = engine(5);
    engine.toggle(ItemId::new(1)).unwrap();

    let applied = engine
        .replace_selection(&ids(&[3, 5, 77]))
        .unwrap();
    assert_eq!(applied, 2);

    let selected: Vec<u64> = engine
        .selected_items()
        .iter()
        .map(|item| item.id.as_u64())
        .collect();
    assert_eq!(selected, vec![3, 5]);
}

#[test]
fn empty_reorder_is_rejected_not_treated_as_reset() {
    let mut engine = engine(5);
    engine.replace_order(ids(&[2, 1])).unwrap();

    let err = engine.replace_order(Vec::new()).unwrap_err();
    assert!(matches!(err, CoreError::EmptyOrder));

    // The previous order is untouched.
    assert_eq!(engine.current_order(), ids(&[2, 1]));
}

#[test]
fn current_order_is_a_defensive_copy() {
    let mut engine = engine(5);
    engine.replace_order(ids(&[2, 1])).unwrap();

    let mut copy = engine.current_order();
    copy.clear();
    assert_eq!(engine.current_order(), ids(&[2, 1]));
}

#[test]
fn state_survives_reopen_from_disk() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");

    {
        let store = JsonStateStore::open(&data_dir).unwrap();
        let mut engine = ListEngine::open(5, store);
        engine.replace_order(ids(&[4, 2])).unwrap();
        engine.toggle(ItemId::new(3)).unwrap();
    }

    let store = JsonStateStore::open(&data_dir).unwrap();
    let engine = ListEngine::open(5, store);
    assert_eq!(engine.current_order(), ids(&[4, 2]));
    assert_eq!(page_ids(&engine, 0, 5, None), vec![4, 2, 1, 3, 5]);
    let selected: Vec<u64> = engine
        .selected_items()
        .iter()
        .map(|item| item.id.as_u64())
        .collect();
    assert_eq!(selected, vec![3]);
}

// =============================================================================
// Persistence rollback
// =============================================================================

/// Blob store whose saves can be made to fail on demand; the test keeps a
/// shared view of what actually got persisted.
#[derive(Clone, Default)]
struct FlakyStore {
    order: Arc<Mutex<Vec<ItemId>>>,
    selected: Arc<Mutex<Vec<ItemId>>>,
    fail_saves: Arc<AtomicBool>,
}

impl FlakyStore {
    fn write_error() -> PersistError {
        PersistError::Write {
            blob: "order",
            path: "/nowhere".into(),
            source: io::Error::other("disk full"),
        }
    }
}

impl StateStore for FlakyStore {
    fn load_order(&self) -> Result<Vec<ItemId>, PersistError> {
        Ok(self.order.lock().unwrap().clone())
    }

    fn save_order(&mut self, order: &[ItemId]) -> Result<(), PersistError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        *self.order.lock().unwrap() = order.to_vec();
        Ok(())
    }

    fn load_selected(&self) -> Result<Vec<ItemId>, PersistError> {
        Ok(self.selected.lock().unwrap().clone())
    }

    fn save_selected(&mut self, selected: &[ItemId]) -> Result<(), PersistError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        *self.selected.lock().unwrap() = selected.to_vec();
        Ok(())
    }
}

#[test]
fn failed_persist_rolls_back_toggle() {
    let store = FlakyStore::default();
    let persisted = store.selected.clone();
    let fail = store.fail_saves.clone();
    let mut engine = ListEngine::open(5, store);

    engine.toggle(ItemId::new(1)).unwrap();
    fail.store(true, Ordering::SeqCst);

    let err = engine.toggle(ItemId::new(2)).unwrap_err();
    assert!(matches!(err, CoreError::Persist(_)));

    // Memory rolled back; disk still holds the last successful state.
    let selected: Vec<u64> = engine
        .selected_items()
        .iter()
        .map(|item| item.id.as_u64())
        .collect();
    assert_eq!(selected, vec![1]);
    assert_eq!(*persisted.lock().unwrap(), ids(&[1]));

    // The next attempt succeeds once the store recovers.
    fail.store(false, Ordering::SeqCst);
    engine.toggle(ItemId::new(2)).unwrap();
    assert_eq!(*persisted.lock().unwrap(), ids(&[1, 2]));
}

#[test]
fn failed_persist_rolls_back_reorder_and_reset() {
    let store = FlakyStore::default();
    let persisted = store.order.clone();
    let fail = store.fail_saves.clone();
    let mut engine = ListEngine::open(5, store);

    engine.replace_order(ids(&[5, 4])).unwrap();
    fail.store(true, Ordering::SeqCst);

    let err = engine.replace_order(ids(&[1, 2])).unwrap_err();
    assert!(matches!(err, CoreError::Persist(_)));
    assert_eq!(engine.current_order(), ids(&[5, 4]));
    assert_eq!(page_ids(&engine, 0, 5, None), vec![5, 4, 1, 2, 3]);
    assert_eq!(*persisted.lock().unwrap(), ids(&[5, 4]));

    let err = engine.reset_order().unwrap_err();
    assert!(matches!(err, CoreError::Persist(_)));
    assert!(engine.is_custom_order());
    assert_eq!(*persisted.lock().unwrap(), ids(&[5, 4]));
}
