use std::fmt;
use std::future::Future;
use std::str::FromStr;

use parley_types::User;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    GitHub,
    Google,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => f.write_str("github"),
            Self::Google => f.write_str("google"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "google" => Ok(Self::Google),
            other => Err(IdentityError::Rejected(format!("unknown provider '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("sign-in was cancelled")]
    Cancelled,

    #[error("sign-in rejected: {0}")]
    Rejected(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// OAuth sign-in, as seen by the chat core. The provider owns the whole
/// flow; the core only needs the resulting profile.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, kind: ProviderKind)
    -> impl Future<Output = Result<User, IdentityError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

/// Provider that always yields the same profile. Used by the terminal
/// client and tests, where there is no browser to run an OAuth popup in.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    user: User,
    allowed: Vec<ProviderKind>,
}

impl FixedIdentity {
    pub fn new(user: User) -> Self {
        Self {
            user,
            allowed: vec![ProviderKind::GitHub, ProviderKind::Google],
        }
    }

    /// Only accept sign-ins through `kinds`.
    pub fn only(mut self, kinds: &[ProviderKind]) -> Self {
        self.allowed = kinds.to_vec();
        self
    }
}

impl IdentityProvider for FixedIdentity {
    async fn sign_in(&self, kind: ProviderKind) -> Result<User, IdentityError> {
        if !self.allowed.contains(&kind) {
            return Err(IdentityError::Rejected(format!("{kind} sign-in is disabled")));
        }
        Ok(self.user.clone())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("GitHub".parse::<ProviderKind>(), Ok(ProviderKind::GitHub));
        assert_eq!("google".parse::<ProviderKind>(), Ok(ProviderKind::Google));
        assert!("myspace".parse::<ProviderKind>().is_err());
    }

    #[tokio::test]
    async fn fixed_identity_honours_allowed_providers() {
        let id = FixedIdentity::new(User::new("u1", "Ada", "")).only(&[ProviderKind::Google]);
        assert_eq!(id.sign_in(ProviderKind::Google).await.unwrap().id, "u1");
        assert!(matches!(
            id.sign_in(ProviderKind::GitHub).await,
            Err(IdentityError::Rejected(_))
        ));
    }
}
