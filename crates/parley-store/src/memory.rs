use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Document, Snapshot, SnapshotListener, SubscriptionHandle};
use crate::paths::{CollectionPath, DocumentPath};
use crate::{DocumentStore, StoreError};

/// In-process document store with live queries.
///
/// Nothing is persisted. Documents in a collection are kept ordered by id, so
/// snapshots come out in a stable order. Listeners run synchronously while the
/// store lock is held, which keeps snapshot delivery in write order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    collections: HashMap<CollectionPath, BTreeMap<String, Value>>,

    /// Live queries: collection -> registered listeners
    listeners: HashMap<CollectionPath, Vec<Listener>>,
    next_listener_id: u64,

    /// Simulated connectivity loss, every call fails with `Unavailable`
    offline: bool,

    /// Collections that reject every call with `PermissionDenied`
    denied: HashSet<CollectionPath>,
}

struct Listener {
    id: u64,
    callback: SnapshotListener,
}

impl StoreInner {
    fn check(&self, collection: &CollectionPath, path: &dyn std::fmt::Display) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        if self.denied.contains(collection) {
            return Err(StoreError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn snapshot(&self, collection: &CollectionPath) -> Snapshot {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn insert(&mut self, path: &DocumentPath, fields: Value) {
        self.collections
            .entry(path.parent().clone())
            .or_default()
            .insert(path.id().to_string(), fields);
        self.notify(path.parent());
    }

    /// Push the current snapshot of `collection` to its listeners.
    fn notify(&mut self, collection: &CollectionPath) {
        if !self.listeners.contains_key(collection) {
            return;
        }
        let snapshot = self.snapshot(collection);
        if let Some(listeners) = self.listeners.get_mut(collection) {
            for listener in listeners.iter_mut() {
                (listener.callback)(Ok(snapshot.clone()));
            }
        }
    }
}

fn require_object(fields: &Value, path: &dyn std::fmt::Display) -> Result<(), StoreError> {
    if fields.is_object() {
        Ok(())
    } else {
        Err(StoreError::Malformed {
            id: path.to_string(),
            reason: "fields must be a JSON object".into(),
        })
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StoreInner) -> Result<T, StoreError>,
    {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {}", e)))?;
        f(&mut inner)
    }

    /// Simulate losing (or regaining) the connection to the backend.
    pub fn set_offline(&self, offline: bool) {
        let _ = self.with_inner(|inner| {
            inner.offline = offline;
            Ok(())
        });
    }

    /// Reject every further call on `collection` with `PermissionDenied`.
    pub fn deny(&self, collection: &CollectionPath) {
        let _ = self.with_inner(|inner| {
            inner.denied.insert(collection.clone());
            Ok(())
        });
    }

    pub fn allow(&self, collection: &CollectionPath) {
        let _ = self.with_inner(|inner| {
            inner.denied.remove(collection);
            Ok(())
        });
    }

    /// Deliver an error to every live query on `collection`, as a backend
    /// does when a listen stream breaks.
    pub fn fail_listeners(&self, collection: &CollectionPath, error: StoreError) {
        let _ = self.with_inner(|inner| {
            if let Some(listeners) = inner.listeners.get_mut(collection) {
                for listener in listeners.iter_mut() {
                    (listener.callback)(Err(error.clone()));
                }
            }
            Ok(())
        });
    }

    /// Number of live queries currently registered on `collection`.
    pub fn listener_count(&self, collection: &CollectionPath) -> usize {
        self.with_inner(|inner| Ok(inner.listeners.get(collection).map_or(0, Vec::len)))
            .unwrap_or(0)
    }

    fn unregister(inner: &Weak<Mutex<StoreInner>>, collection: &CollectionPath, id: u64) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut inner = match inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(listeners) = inner.listeners.get_mut(collection) {
            listeners.retain(|l| l.id != id);
            if listeners.is_empty() {
                inner.listeners.remove(collection);
            }
        }
        debug!("Live query {} on {} cancelled", id, collection);
    }
}

impl DocumentStore for MemoryStore {
    async fn get_all(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.with_inner(|inner| {
            inner.check(collection, collection)?;
            Ok(inner.snapshot(collection))
        })
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.with_inner(|inner| {
            inner.check(path.parent(), path)?;
            Ok(inner
                .collections
                .get(path.parent())
                .and_then(|docs| docs.get(path.id()))
                .map(|fields| Document::new(path.id(), fields.clone())))
        })
    }

    async fn put(&self, path: &DocumentPath, fields: Value) -> Result<(), StoreError> {
        require_object(&fields, path)?;
        self.with_inner(|inner| {
            inner.check(path.parent(), path)?;
            inner.insert(path, fields);
            Ok(())
        })
    }

    async fn add(&self, collection: &CollectionPath, fields: Value) -> Result<String, StoreError> {
        require_object(&fields, collection)?;
        let id = Uuid::new_v4().simple().to_string();
        let path = collection.doc(&id)?;
        self.with_inner(|inner| {
            inner.check(collection, &path)?;
            inner.insert(&path, fields);
            Ok(())
        })?;
        debug!("Added {}", path);
        Ok(id)
    }

    async fn subscribe(
        &self,
        collection: &CollectionPath,
        mut listener: SnapshotListener,
    ) -> Result<SubscriptionHandle, StoreError> {
        let id = self.with_inner(|inner| {
            if let Err(e) = inner.check(collection, collection) {
                warn!("Live query on {} refused: {}", collection, e);
                return Err(e);
            }
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;

            // Initial snapshot goes out before any later write can slip in
            listener(Ok(inner.snapshot(collection)));
            inner
                .listeners
                .entry(collection.clone())
                .or_default()
                .push(Listener { id, callback: listener });
            Ok(id)
        })?;
        debug!("Live query {} registered on {}", id, collection);

        let weak = Arc::downgrade(&self.inner);
        let collection = collection.clone();
        Ok(SubscriptionHandle::new(move || {
            MemoryStore::unregister(&weak, &collection, id)
        }))
    }
}
