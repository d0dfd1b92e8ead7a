//! In-memory resolution store shared by the tool executor and the front end.

use super::board::{CategoryTally, tally_by_category};
use super::model::Resolution;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification emitted after every store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A resolution was prepended to the board.
    Added(Resolution),
    /// A resolution was removed from the board.
    Removed { id: String },
}

/// Ordered collection of committed resolutions, most recent first.
///
/// Cloning the store yields another handle onto the same collection. Writers
/// hold the lock only for the duration of a single insert or removal, so
/// readers always observe a consistent snapshot.
#[derive(Clone)]
pub struct ResolutionStore {
    resolutions: Arc<RwLock<Vec<Resolution>>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ResolutionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            resolutions: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Resolution>> {
        self.resolutions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Resolution>> {
        self.resolutions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts a resolution at the front of the board.
    pub fn add(&self, resolution: Resolution) {
        {
            let mut resolutions = self.write();
            resolutions.insert(0, resolution.clone());
        }
        tracing::debug!("[Store] Added resolution {}", resolution.id);
        // No subscribers is fine; the snapshot is still authoritative.
        let _ = self.events.send(StoreEvent::Added(resolution));
    }

    /// Removes the resolution with the given id.
    ///
    /// Returns the removed record, or `None` (and emits nothing) when no
    /// record has that id.
    pub fn remove(&self, id: &str) -> Option<Resolution> {
        let removed = {
            let mut resolutions = self.write();
            let index = resolutions.iter().position(|r| r.id == id)?;
            resolutions.remove(index)
        };
        tracing::debug!("[Store] Removed resolution {}", id);
        let _ = self.events.send(StoreEvent::Removed { id: id.to_string() });
        Some(removed)
    }

    /// Returns a copy of the board, most recent first.
    pub fn snapshot(&self) -> Vec<Resolution> {
        self.read().clone()
    }

    /// Looks up a single resolution by id.
    pub fn get(&self, id: &str) -> Option<Resolution> {
        self.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Per-category counts for the board chart.
    pub fn category_tallies(&self) -> Vec<CategoryTally> {
        tally_by_category(&self.read())
    }

    /// Subscribes to add/remove notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::ResolutionCategory;

    fn sample(title: &str) -> Resolution {
        Resolution::new(title, ResolutionCategory::Health, "feel better", "walk today")
    }

    #[test]
    fn test_add_prepends() {
        let store = ResolutionStore::new();
        store.add(sample("first"));
        store.add(sample("second"));

        let titles: Vec<String> = store.snapshot().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_then_remove_restores_previous_content() {
        let store = ResolutionStore::new();
        store.add(sample("keep"));
        let before = store.snapshot();

        let added = sample("temporary");
        let id = added.id.clone();
        store.add(added);
        assert_eq!(store.len(), 2);

        let removed = store.remove(&id).expect("resolution should be removed");
        assert_eq!(removed.title, "temporary");
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let store = ResolutionStore::new();
        store.add(sample("only"));
        let mut events = store.subscribe();

        assert!(store.remove("missing").is_none());
        assert_eq!(store.len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ResolutionStore::new();
        let handle = store.clone();
        handle.add(sample("shared"));
        assert_eq!(store.len(), 1);
        assert!(store.get(&handle.snapshot()[0].id).is_some());
    }

    #[tokio::test]
    async fn test_subscribers_receive_add_and_remove() {
        let store = ResolutionStore::new();
        let mut events = store.subscribe();

        let resolution = sample("notify");
        let id = resolution.id.clone();
        store.add(resolution.clone());
        store.remove(&id);

        assert_eq!(events.recv().await.unwrap(), StoreEvent::Added(resolution));
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Removed { id });
    }
}
