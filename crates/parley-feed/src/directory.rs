use std::sync::Arc;

use parley_store::{Document, DocumentStore, StoreError};
use parley_types::api::{ConversationDocument, UserDocument};
use parley_types::{ConversationId, ConversationKind, ConversationSummary, User};
use tracing::{debug, info, warn};

use crate::error::{ChatError, Result};
use crate::layout;

/// Users and conversation membership.
pub struct Directory<S: DocumentStore> {
    store: Arc<S>,
}

fn to_value<T: serde::Serialize>(value: &T, id: &str) -> std::result::Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Malformed {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn decode_users(docs: Vec<Document>) -> Vec<User> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<UserDocument>() {
            Ok(fields) => Some(fields.into_user(doc.id)),
            Err(e) => {
                warn!("Skipping undecodable user: {}", e);
                None
            }
        })
        .collect()
}

impl<S: DocumentStore> Directory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // -- Users --

    pub async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let path = layout::user(id).map_err(ChatError::Directory)?;
        let Some(doc) = self.store.get(&path).await.map_err(ChatError::Directory)? else {
            return Ok(None);
        };
        let fields = doc.decode::<UserDocument>().map_err(ChatError::Directory)?;
        Ok(Some(fields.into_user(doc.id)))
    }

    /// Record a user on first sign-in. An existing record wins: profiles are
    /// never rewritten, so the stored user is what comes back.
    pub async fn ensure_user(&self, profile: &User) -> Result<User> {
        if let Some(existing) = self.find_user(&profile.id).await? {
            debug!("User {} already registered", existing.id);
            return Ok(existing);
        }

        let path = layout::user(&profile.id).map_err(ChatError::Directory)?;
        let fields = to_value(&UserDocument::from_user(profile), &profile.id)
            .map_err(ChatError::Directory)?;
        self.store
            .put(&path, fields)
            .await
            .map_err(ChatError::Directory)?;

        info!("Registered user {} ({})", profile.id, profile.display_name);
        Ok(profile.clone())
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let path = layout::users().map_err(ChatError::Directory)?;
        let docs = self.store.get_all(&path).await.map_err(ChatError::Directory)?;
        Ok(decode_users(docs))
    }

    /// Everyone except `me`, sorted for display.
    pub async fn contacts(&self, me: &str) -> Result<Vec<User>> {
        let mut users = self.list_users().await?;
        users.retain(|u| u.id != me);
        users.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(users)
    }

    // -- Conversations --

    /// Make a conversation and its participants discoverable. Safe to repeat.
    pub async fn register_conversation(
        &self,
        conversation: &ConversationId,
        kind: ConversationKind,
        members: &[&User],
    ) -> Result<()> {
        let chat = layout::chat(conversation).map_err(ChatError::Directory)?;
        let fields = to_value(&ConversationDocument { kind }, conversation.as_str())
            .map_err(ChatError::Directory)?;
        self.store
            .put(&chat, fields)
            .await
            .map_err(ChatError::Directory)?;

        let member_path = layout::members(conversation).map_err(ChatError::Directory)?;
        for member in members {
            let path = member_path.doc(&member.id).map_err(ChatError::Directory)?;
            let fields = to_value(&UserDocument::from_user(member), &member.id)
                .map_err(ChatError::Directory)?;
            self.store
                .put(&path, fields)
                .await
                .map_err(ChatError::Directory)?;
        }

        debug!("Conversation {} has {} registered members", conversation, members.len());
        Ok(())
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let chats = layout::chats().map_err(ChatError::Directory)?;
        let docs = self.store.get_all(&chats).await.map_err(ChatError::Directory)?;

        let mut summaries = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = match ConversationId::new(doc.id.as_str()) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Skipping conversation '{}': {}", doc.id, e);
                    continue;
                }
            };
            let members_path = layout::members(&id).map_err(ChatError::Directory)?;
            let members = self
                .store
                .get_all(&members_path)
                .await
                .map_err(ChatError::Directory)?;
            summaries.push(ConversationSummary {
                id,
                members: decode_users(members),
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use parley_store::MemoryStore;

    use super::*;

    fn directory() -> (Arc<MemoryStore>, Directory<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Directory::new(store))
    }

    #[tokio::test]
    async fn ensure_user_creates_once() {
        let (_store, dir) = directory();
        let first = User::new("u1", "Ada", "https://img/1.png");
        assert_eq!(dir.ensure_user(&first).await.unwrap(), first);

        let renamed = User::new("u1", "Ada Lovelace", "https://img/2.png");
        assert_eq!(dir.ensure_user(&renamed).await.unwrap(), first);
        assert_eq!(dir.find_user("u1").await.unwrap(), Some(first));
        assert_eq!(dir.find_user("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn contacts_exclude_self_and_sort_by_name() {
        let (_store, dir) = directory();
        for user in [
            User::new("me", "Me", ""),
            User::new("z", "Zed", ""),
            User::new("b", "Bea", ""),
            User::new("a", "Bea", ""),
        ] {
            dir.ensure_user(&user).await.unwrap();
        }
        let ids: Vec<String> = dir
            .contacts("me")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "z"]);
    }

    #[tokio::test]
    async fn lists_registered_conversations() {
        let (_store, dir) = directory();
        let ada = User::new("ada", "Ada", "");
        let bob = User::new("bob", "Bob", "");
        let direct = ConversationId::direct(&ada.id, &bob.id).unwrap();

        dir.register_conversation(&direct, ConversationKind::Direct, &[&ada, &bob])
            .await
            .unwrap();
        dir.register_conversation(&ConversationId::global(), ConversationKind::Global, &[&ada])
            .await
            .unwrap();
        // Registering again does not duplicate members
        dir.register_conversation(&direct, ConversationKind::Direct, &[&ada, &bob])
            .await
            .unwrap();

        let summaries = dir.list_conversations().await.unwrap();
        assert_eq!(summaries.len(), 2);
        let direct_summary = summaries.iter().find(|s| s.id == direct).unwrap();
        assert_eq!(direct_summary.members, vec![ada.clone(), bob]);
        let global_summary = summaries.iter().find(|s| s.id.is_global()).unwrap();
        assert_eq!(global_summary.members, vec![ada]);
    }

    #[tokio::test]
    async fn store_failures_surface_as_directory_errors() {
        let (store, dir) = directory();
        store.set_offline(true);
        let err = dir.list_users().await.unwrap_err();
        assert!(matches!(err, ChatError::Directory(StoreError::Unavailable(_))));
    }
}
