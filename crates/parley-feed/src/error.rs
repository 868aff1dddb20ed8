use parley_store::StoreError;
use parley_types::{ConversationId, ConversationIdError};
use thiserror::Error;

use crate::identity::IdentityError;

/// Input rejected before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message contents are empty")]
    EmptyContents,

    #[error(transparent)]
    ConversationId(#[from] ConversationIdError),
}

#[derive(Debug, Error)]
pub enum ChatError {
    /// The live query could not be registered. The feed keeps its last
    /// known good state.
    #[error("subscription to '{conversation}' failed: {source}")]
    Subscription {
        conversation: ConversationId,
        #[source]
        source: StoreError,
    },

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The store rejected or never received a message. The caller still
    /// holds the contents and can retry.
    #[error("message write to '{conversation}' failed: {source}")]
    Write {
        conversation: ConversationId,
        #[source]
        source: StoreError,
    },

    #[error("user directory: {0}")]
    Directory(#[source] StoreError),

    #[error("identity provider: {0}")]
    Identity(#[from] IdentityError),

    #[error("not signed in")]
    SignedOut,

    #[error("no conversation is open")]
    NoConversation,

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("a message is already being sent")]
    SendInFlight,
}

impl From<ConversationIdError> for ChatError {
    fn from(err: ConversationIdError) -> Self {
        Self::Validation(err.into())
    }
}

impl ChatError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether resubmitting the same input can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Write { source, .. } | Self::Subscription { source, .. } => {
                source.is_transient()
            }
            Self::Directory(source) => source.is_transient(),
            Self::Identity(IdentityError::Unavailable(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
