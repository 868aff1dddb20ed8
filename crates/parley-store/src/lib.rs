//! Client-side view of the hosted document database.
//!
//! The chat core talks to the backend only through [`DocumentStore`]: plain
//! CRUD on slash-separated paths plus live queries that push a complete
//! collection snapshot on every change. [`MemoryStore`] is an in-process
//! implementation with the same delivery semantics and no persistence.

pub mod memory;
pub mod models;
pub mod paths;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{Document, Snapshot, SnapshotListener, SubscriptionHandle};
pub use paths::{CollectionPath, DocumentPath};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied on {path}")]
    PermissionDenied { path: String },

    #[error("invalid path '{0}'")]
    InvalidPath(String),

    #[error("malformed document '{id}': {reason}")]
    Malformed { id: String, reason: String },
}

impl StoreError {
    /// Errors a later retry may get past.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Operations the chat core needs from the document database.
pub trait DocumentStore: Send + Sync + 'static {
    /// All documents currently in a collection.
    fn get_all(
        &self,
        collection: &CollectionPath,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    fn get(
        &self,
        path: &DocumentPath,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Create or overwrite the document at `path`.
    fn put(
        &self,
        path: &DocumentPath,
        fields: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Create a document with a store-generated id. Returns the id.
    fn add(
        &self,
        collection: &CollectionPath,
        fields: Value,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Register a live query. The listener receives the current snapshot and
    /// then a fresh one after every change, until the handle is cancelled.
    fn subscribe(
        &self,
        collection: &CollectionPath,
        listener: SnapshotListener,
    ) -> impl Future<Output = Result<SubscriptionHandle, StoreError>> + Send;
}
