use std::sync::{Arc, Mutex, MutexGuard};

use parley_store::{DocumentStore, Snapshot, SnapshotListener, StoreError, SubscriptionHandle};
use parley_types::api::MessageDocument;
use parley_types::{ConversationId, Feed, FeedChange, FeedState, FeedStatus, Generation, User};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{ChatError, Result, ValidationError};
use crate::layout;
use crate::order;

/// Turns a conversation's live query into an ordered feed and forwards
/// outgoing messages to the store.
///
/// At most one subscription is active at a time. Every subscription gets a
/// fresh [`Generation`]; snapshots delivered for an older generation are
/// dropped, so a slow or leaky store can never put a previous conversation
/// back on screen.
pub struct Reconciler<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
    active: Option<ActiveSubscription>,
}

struct ActiveSubscription {
    generation: Generation,
    handle: SubscriptionHandle,
}

/// State reachable from store listeners.
struct Shared {
    inner: Mutex<Inner>,
    feed: watch::Sender<Feed>,
}

struct Inner {
    /// Latest generation handed out
    generation: Generation,
    state: FeedState,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Listener body. The state lock is held while publishing, so an
    /// unsubscribe or resubscribe cannot interleave with a stale emission.
    fn on_snapshot(
        &self,
        generation: Generation,
        conversation: &ConversationId,
        event: std::result::Result<Snapshot, StoreError>,
    ) {
        let mut inner = self.lock();
        if inner.state.generation() != Some(generation) {
            debug!(
                "Dropping snapshot for {} from stale generation {}",
                conversation, generation.0
            );
            return;
        }

        match event {
            Ok(snapshot) => {
                let messages = order::normalize(snapshot);
                let change = match inner.state {
                    FeedState::Active { .. } => order::diff(&self.feed.borrow().messages, &messages),
                    _ => FeedChange::Reset,
                };
                debug!(
                    "Snapshot for {}: {} messages ({:?})",
                    conversation,
                    messages.len(),
                    change
                );
                self.feed.send_replace(Feed {
                    conversation: Some(conversation.clone()),
                    generation,
                    messages,
                    change,
                    status: FeedStatus::Live,
                });
                inner.state = FeedState::Active {
                    conversation: conversation.clone(),
                    generation,
                };
            }
            Err(e) => {
                warn!("Live query for {} failed, keeping last feed: {}", conversation, e);
                self.feed.send_modify(|feed| {
                    feed.change = FeedChange::Unchanged;
                    feed.status = FeedStatus::Degraded;
                });
            }
        }
    }
}

impl<S: DocumentStore> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let (feed, _) = watch::channel(Feed::default());
        Self {
            store,
            clock,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    generation: Generation::default(),
                    state: FeedState::Idle,
                }),
                feed,
            }),
            active: None,
        }
    }

    /// Receiver for every feed this reconciler publishes.
    pub fn feed(&self) -> watch::Receiver<Feed> {
        self.shared.feed.subscribe()
    }

    /// The most recently published feed.
    pub fn current(&self) -> Feed {
        self.shared.feed.borrow().clone()
    }

    pub fn state(&self) -> FeedState {
        self.shared.lock().state.clone()
    }

    pub fn conversation(&self) -> Option<ConversationId> {
        self.shared.lock().state.conversation().cloned()
    }

    /// Switch the feed to `conversation`.
    ///
    /// Any previous subscription is cancelled first and an empty pending feed
    /// for the new conversation is published right away. If the store refuses
    /// the live query the reconciler goes back to idle and the feed is marked
    /// degraded.
    pub async fn subscribe(&mut self, conversation: ConversationId) -> Result<Generation> {
        let path = layout::messages(&conversation).map_err(|source| ChatError::Subscription {
            conversation: conversation.clone(),
            source,
        })?;

        let (generation, previous) = {
            let mut inner = self.shared.lock();
            inner.generation = inner.generation.next();
            let generation = inner.generation;
            inner.state = FeedState::Subscribing {
                conversation: conversation.clone(),
                generation,
            };
            self.shared
                .feed
                .send_replace(Feed::pending(conversation.clone(), generation));
            (generation, self.active.take())
        };
        if let Some(previous) = previous {
            debug!("Cancelling live query of generation {}", previous.generation.0);
            previous.handle.cancel();
        }

        info!("Subscribing to {} (generation {})", conversation, generation.0);

        let shared = Arc::clone(&self.shared);
        let listener_conversation = conversation.clone();
        let listener: SnapshotListener = Box::new(move |event: std::result::Result<Snapshot, StoreError>| {
            shared.on_snapshot(generation, &listener_conversation, event)
        });

        match self.store.subscribe(&path, listener).await {
            Ok(handle) => {
                self.active = Some(ActiveSubscription { generation, handle });
                Ok(generation)
            }
            Err(source) => {
                warn!("Could not subscribe to {}: {}", conversation, source);
                let mut inner = self.shared.lock();
                if inner.generation == generation {
                    inner.state = FeedState::Idle;
                    self.shared.feed.send_modify(|feed| {
                        feed.status = FeedStatus::Degraded;
                    });
                }
                Err(ChatError::Subscription {
                    conversation,
                    source,
                })
            }
        }
    }

    /// Cancel the active subscription and publish an empty idle feed.
    /// Calling it again, or with nothing subscribed, does nothing.
    pub fn unsubscribe(&mut self) {
        let released = {
            let mut inner = self.shared.lock();
            let already_idle = matches!(inner.state, FeedState::Idle)
                && self.active.is_none()
                && self.shared.feed.borrow().conversation.is_none();
            if already_idle {
                return;
            }
            inner.generation = inner.generation.next();
            inner.state = FeedState::Idle;
            self.shared.feed.send_replace(Feed::idle(inner.generation));
            self.active.take()
        };

        if let Some(active) = released {
            info!("Unsubscribed generation {}", active.generation.0);
            active.handle.cancel();
        }
    }

    /// Write a new message to `conversation` and return its id.
    ///
    /// Empty contents are rejected without touching the store. The message
    /// shows up in the feed once the store delivers the next snapshot.
    pub async fn submit(
        &self,
        conversation: &ConversationId,
        author: &User,
        contents: &str,
    ) -> Result<String> {
        if contents.is_empty() {
            return Err(ValidationError::EmptyContents.into());
        }

        let write_error = |source: StoreError| ChatError::Write {
            conversation: conversation.clone(),
            source,
        };

        let path = layout::messages(conversation).map_err(write_error)?;
        let document = MessageDocument::new(author, contents, self.clock.now());
        let fields = serde_json::to_value(&document).map_err(|e| {
            write_error(StoreError::Malformed {
                id: path.to_string(),
                reason: e.to_string(),
            })
        })?;

        match self.store.add(&path, fields).await {
            Ok(id) => {
                debug!("Message {} from {} written to {}", id, author.id, conversation);
                Ok(id)
            }
            Err(source) => {
                error!("Failed to write message to {}: {}", conversation, source);
                Err(write_error(source))
            }
        }
    }
}
