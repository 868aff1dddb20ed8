use serde::Serialize;

use crate::models::{ConversationId, Message};

/// Tag handed to each subscription. Strictly increases per reconciler, so an
/// event carrying an older generation belongs to a superseded subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Lifecycle of a reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data")]
pub enum FeedState {
    /// No subscription
    Idle,

    /// Registration with the store is in flight
    Subscribing {
        conversation: ConversationId,
        generation: Generation,
    },

    /// Receiving snapshots
    Active {
        conversation: ConversationId,
        generation: Generation,
    },
}

impl FeedState {
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Self::Idle => None,
            Self::Subscribing { generation, .. } | Self::Active { generation, .. } => {
                Some(*generation)
            }
        }
    }

    pub fn conversation(&self) -> Option<&ConversationId> {
        match self {
            Self::Idle => None,
            Self::Subscribing { conversation, .. } | Self::Active { conversation, .. } => {
                Some(conversation)
            }
        }
    }
}

/// How the latest feed relates to the one published before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedChange {
    /// New conversation, first snapshot of a subscription, or teardown
    Reset,
    /// The previous ordered list is a prefix of this one
    Appended { count: usize },
    /// Same messages in the same order
    Unchanged,
    /// Anything else, e.g. a message that sorted into the middle
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    /// Waiting for the first snapshot
    Pending,
    Live,
    /// The store reported an error; messages are the last known good set
    Degraded,
}

/// Ordered view of one conversation, republished on every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feed {
    pub conversation: Option<ConversationId>,
    pub generation: Generation,
    pub messages: Vec<Message>,
    pub change: FeedChange,
    pub status: FeedStatus,
}

impl Feed {
    /// Feed of a reconciler with nothing subscribed.
    pub fn idle(generation: Generation) -> Self {
        Self {
            conversation: None,
            generation,
            messages: Vec::new(),
            change: FeedChange::Reset,
            status: FeedStatus::Live,
        }
    }

    /// Empty placeholder published as soon as a conversation is selected.
    pub fn pending(conversation: ConversationId, generation: Generation) -> Self {
        Self {
            conversation: Some(conversation),
            generation,
            messages: Vec::new(),
            change: FeedChange::Reset,
            status: FeedStatus::Pending,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message_ids(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.id.as_str())
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::idle(Generation::default())
    }
}
