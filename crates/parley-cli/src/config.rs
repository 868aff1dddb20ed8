use anyhow::Context;
use parley_feed::ProviderKind;
use parley_types::{ConversationId, User};

/// Conversation opened at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartIn {
    Global,
    /// Direct conversation with this user id
    Direct(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub user: User,
    pub provider: ProviderKind,
    pub start_in: StartIn,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let id = var("PARLEY_USER_ID").unwrap_or_else(|| "local".into());
        let display_name = var("PARLEY_DISPLAY_NAME").unwrap_or_else(|| id.clone());
        let photo_url = var("PARLEY_PHOTO_URL").unwrap_or_default();

        let provider = var("PARLEY_PROVIDER")
            .unwrap_or_else(|| "github".into())
            .parse::<ProviderKind>()
            .context("PARLEY_PROVIDER")?;

        let start_in = match var("PARLEY_CONVERSATION") {
            None => StartIn::Global,
            Some(target) if target == ConversationId::GLOBAL => StartIn::Global,
            Some(target) if target.trim().is_empty() => StartIn::Global,
            Some(target) => StartIn::Direct(target),
        };

        Ok(Self {
            user: User::new(id, display_name, photo_url),
            provider,
            start_in,
        })
    }
}
