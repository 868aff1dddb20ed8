use std::sync::Arc;

use parley_store::DocumentStore;
use parley_types::{ConversationId, ConversationKind, ConversationSummary, Feed, User};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::composer::Composer;
use crate::directory::Directory;
use crate::error::{ChatError, Result};
use crate::identity::{IdentityProvider, ProviderKind};
use crate::reconciler::Reconciler;
use crate::render::{self, Bubble};

/// Everything one chat view needs, wired explicitly: the signed-in user,
/// the open conversation's feed and the message input.
pub struct ChatClient<S: DocumentStore, P: IdentityProvider> {
    identity: P,
    directory: Directory<S>,
    reconciler: Reconciler<S>,
    composer: Composer,
    me: watch::Sender<Option<User>>,
}

impl<S: DocumentStore, P: IdentityProvider> ChatClient<S, P> {
    pub fn new(store: Arc<S>, identity: P) -> Self {
        Self::with_clock(store, identity, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(store: Arc<S>, identity: P, clock: Arc<dyn Clock>) -> Self {
        let (me, _) = watch::channel(None);
        Self {
            identity,
            directory: Directory::new(store.clone()),
            reconciler: Reconciler::with_clock(store, clock),
            composer: Composer::new(),
            me,
        }
    }

    // -- Identity --

    /// Sign in and register the user on first visit.
    pub async fn sign_in(&mut self, kind: ProviderKind) -> Result<User> {
        let profile = self.identity.sign_in(kind).await?;
        let user = self.directory.ensure_user(&profile).await?;
        info!("Signed in as {} via {}", user.id, kind);
        self.me.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Tear down the open conversation and forget the user.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.reconciler.unsubscribe();
        self.composer.reset();
        if let Some(user) = self.me.send_replace(None) {
            info!("Signed out {}", user.id);
        }
        self.identity.sign_out().await?;
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.me.borrow().clone()
    }

    /// Observe sign-in and sign-out.
    pub fn identity(&self) -> watch::Receiver<Option<User>> {
        self.me.subscribe()
    }

    fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(ChatError::SignedOut)
    }

    // -- Conversations --

    pub async fn contacts(&self) -> Result<Vec<User>> {
        let me = self.require_user()?;
        self.directory.contacts(&me.id).await
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.directory.list_conversations().await
    }

    /// Open the one-to-one conversation with `other`.
    pub async fn open_direct(&mut self, other: &User) -> Result<ConversationId> {
        let me = self.require_user()?;
        let id = ConversationId::direct(&me.id, &other.id)?;
        self.directory
            .register_conversation(&id, ConversationKind::Direct, &[&me, other])
            .await?;
        self.open(id).await
    }

    /// Open the direct conversation with the user `user_id`.
    pub async fn open_direct_with(&mut self, user_id: &str) -> Result<ConversationId> {
        let other = self
            .directory
            .find_user(user_id)
            .await?
            .ok_or_else(|| ChatError::UnknownUser(user_id.to_string()))?;
        self.open_direct(&other).await
    }

    pub async fn open_global(&mut self) -> Result<ConversationId> {
        let me = self.require_user()?;
        let id = ConversationId::global();
        self.directory
            .register_conversation(&id, ConversationKind::Global, &[&me])
            .await?;
        self.open(id).await
    }

    async fn open(&mut self, id: ConversationId) -> Result<ConversationId> {
        self.reconciler.subscribe(id.clone()).await?;
        Ok(id)
    }

    // -- Messages --

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Send the composer's draft to the open conversation.
    pub async fn send(&mut self) -> Result<String> {
        let me = self.require_user()?;
        let conversation = self.reconciler.conversation().ok_or(ChatError::NoConversation)?;
        let Some(contents) = self.composer.begin() else {
            warn!("Send requested while another send is in flight");
            return Err(ChatError::SendInFlight);
        };

        let outcome = self.reconciler.submit(&conversation, &me, &contents).await;
        self.composer.finish(&outcome);
        outcome
    }

    // -- Feed --

    pub fn feed(&self) -> watch::Receiver<Feed> {
        self.reconciler.feed()
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    /// The current feed laid out for the signed-in user.
    pub fn bubbles(&self) -> Vec<Bubble> {
        let me = self.current_user();
        render::render(&self.reconciler.current(), me.as_ref().map(|u| u.id.as_str()))
    }
}
