//! Where chat data lives in the document store.
//!
//! ```text
//! users/{userId}
//! chats/{conversationId}
//! chats/{conversationId}/users/{userId}
//! chats/{conversationId}/data/{messageId}
//! ```

use parley_store::{CollectionPath, DocumentPath, StoreError};
use parley_types::ConversationId;

const USERS: &str = "users";
const CHATS: &str = "chats";
const MEMBERS: &str = "users";
const MESSAGES: &str = "data";

pub fn users() -> Result<CollectionPath, StoreError> {
    CollectionPath::parse(USERS)
}

pub fn user(id: &str) -> Result<DocumentPath, StoreError> {
    users()?.doc(id)
}

pub fn chats() -> Result<CollectionPath, StoreError> {
    CollectionPath::parse(CHATS)
}

pub fn chat(conversation: &ConversationId) -> Result<DocumentPath, StoreError> {
    chats()?.doc(conversation.as_str())
}

pub fn members(conversation: &ConversationId) -> Result<CollectionPath, StoreError> {
    chat(conversation)?.collection(MEMBERS)
}

pub fn messages(conversation: &ConversationId) -> Result<CollectionPath, StoreError> {
    chat(conversation)?.collection(MESSAGES)
}
