//! Parley chat core.
//!
//! Keeps a conversation's message feed in sync with a hosted document
//! store: subscribes to the conversation's live query, turns every snapshot
//! into a chronologically ordered [`Feed`](parley_types::Feed), and forwards
//! new messages back to the store.

pub mod client;
pub mod clock;
pub mod composer;
pub mod directory;
pub mod error;
pub mod identity;
pub mod layout;
pub mod order;
pub mod reconciler;
pub mod render;

pub use client::ChatClient;
pub use clock::{Clock, SystemClock};
pub use composer::Composer;
pub use directory::Directory;
pub use error::{ChatError, ValidationError};
pub use identity::{FixedIdentity, IdentityError, IdentityProvider, ProviderKind};
pub use order::order;
pub use reconciler::Reconciler;
pub use render::{Bubble, render};
