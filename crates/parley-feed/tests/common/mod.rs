#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use parley_store::{
    CollectionPath, Document, DocumentPath, DocumentStore, SnapshotListener, StoreError,
    SubscriptionHandle,
};
use serde_json::{Value, json};

/// Store whose snapshots are delivered by hand.
///
/// Cancelling a subscription only flags it; the listener stays callable so
/// tests can replay a snapshot that was already in flight when the
/// subscription went away.
#[derive(Default)]
pub struct ManualStore {
    registrations: Mutex<Vec<Registration>>,
    writes: AtomicUsize,
}

struct Registration {
    collection: CollectionPath,
    listener: SnapshotListener,
    cancelled: Arc<AtomicBool>,
}

impl ManualStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `snapshot` to the `index`-th registration, cancelled or not.
    pub fn emit(&self, index: usize, snapshot: Vec<Document>) {
        let mut regs = self.registrations.lock().unwrap();
        (regs[index].listener)(Ok(snapshot));
    }

    pub fn emit_error(&self, index: usize, error: StoreError) {
        let mut regs = self.registrations.lock().unwrap();
        (regs[index].listener)(Err(error));
    }

    pub fn collection_of(&self, index: usize) -> String {
        self.registrations.lock().unwrap()[index].collection.to_string()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.registrations.lock().unwrap()[index]
            .cancelled
            .load(Ordering::SeqCst)
    }

    pub fn registrations(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DocumentStore for ManualStore {
    async fn get_all(&self, _collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        Ok(Vec::new())
    }

    async fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(None)
    }

    async fn put(&self, _path: &DocumentPath, _fields: Value) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add(&self, _collection: &CollectionPath, _fields: Value) -> Result<String, StoreError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(format!("generated-{n}"))
    }

    async fn subscribe(
        &self,
        collection: &CollectionPath,
        listener: SnapshotListener,
    ) -> Result<SubscriptionHandle, StoreError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.registrations.lock().unwrap().push(Registration {
            collection: collection.clone(),
            listener,
            cancelled: cancelled.clone(),
        });
        Ok(SubscriptionHandle::new(move || {
            cancelled.store(true, Ordering::SeqCst)
        }))
    }
}

pub fn message_doc(id: &str, author: &str, seconds: i64) -> Document {
    Document::new(
        id,
        json!({
            "contents": format!("{author} says {id}"),
            "displayName": author,
            "id": author,
            "photoURL": "",
            "time": { "seconds": seconds, "nanoseconds": 0 },
        }),
    )
}
