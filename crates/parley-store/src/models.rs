//! Store-level record types. Distinct from parley-types models to keep the
//! store layer independent of the chat domain.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::StoreError;

/// A document as returned by the store: its id within the collection plus
/// its fields, always a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Deserialize the fields into a typed shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        T::deserialize(&self.fields).map_err(|e| StoreError::Malformed {
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Complete contents of a collection at one point in time.
pub type Snapshot = Vec<Document>;

/// Callback invoked with every snapshot (or error) of a live query.
///
/// Stores call listeners in delivery order. A listener must not call back
/// into the store that invokes it.
pub type SnapshotListener = Box<dyn FnMut(Result<Snapshot, StoreError>) + Send + 'static>;

/// Cancels a live query when `cancel`led or dropped.
#[must_use = "dropping the handle cancels the subscription"]
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
