use serde::{Deserialize, Serialize};

use crate::models::{ConversationKind, Message, Timestamp, User};

// Document shapes as they are laid out in the hosted store. Field names are
// fixed by the existing data, hence the renames.

// -- Users --

/// `users/{userId}` and `chats/{conversationId}/users/{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(rename = "photoUrl", default)]
    pub photo_url: String,
}

impl UserDocument {
    pub fn from_user(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
        }
    }

    pub fn into_user(self, id: impl Into<String>) -> User {
        User {
            id: id.into(),
            display_name: self.display_name,
            photo_url: self.photo_url,
        }
    }
}

// -- Conversations --

/// `chats/{conversationId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDocument {
    pub kind: ConversationKind,
}

// -- Messages --

/// `chats/{conversationId}/data/{messageId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDocument {
    pub contents: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    /// Author id. Not the message id, which is the document id.
    #[serde(rename = "id")]
    pub author_id: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    pub time: Timestamp,
}

impl MessageDocument {
    pub fn new(author: &User, contents: impl Into<String>, time: Timestamp) -> Self {
        Self {
            contents: contents.into(),
            display_name: author.display_name.clone(),
            author_id: author.id.clone(),
            photo_url: author.photo_url.clone(),
            time,
        }
    }

    pub fn into_message(self, id: impl Into<String>) -> Message {
        Message {
            id: id.into(),
            author_id: self.author_id,
            author_display_name: self.display_name,
            author_photo_url: self.photo_url,
            contents: self.contents,
            time: self.time,
        }
    }
}
