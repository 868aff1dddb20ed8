pub mod api;
pub mod events;
pub mod models;

pub use events::{Feed, FeedChange, FeedState, FeedStatus, Generation};
pub use models::{
    ConversationId, ConversationIdError, ConversationKind, ConversationSummary, Message, Timestamp,
    User,
};
