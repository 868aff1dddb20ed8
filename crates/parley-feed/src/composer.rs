use crate::error::Result;

/// Message input state: the draft being typed and whether the input is
/// locked while a send is in flight.
///
/// The draft is cleared only after a successful send. A rejected or failed
/// send leaves it in place so the user can fix or retry it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Composer {
    draft: String,
    disabled: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Replace the draft. Ignored while a send is in flight.
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        if !self.disabled {
            self.draft = draft.into();
        }
    }

    /// Lock the input and hand out the contents to send. `None` if a send is
    /// already in flight.
    pub fn begin(&mut self) -> Option<String> {
        if self.disabled {
            return None;
        }
        self.disabled = true;
        Some(self.draft.clone())
    }

    /// Unlock the input after a send attempt.
    pub fn finish<T>(&mut self, outcome: &Result<T>) {
        if outcome.is_ok() {
            self.draft.clear();
        }
        self.disabled = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use parley_store::StoreError;
    use parley_types::ConversationId;

    use super::*;
    use crate::error::{ChatError, ValidationError};

    #[test]
    fn clears_after_success() {
        let mut composer = Composer::new();
        composer.set_draft("hello");
        assert_eq!(composer.begin().as_deref(), Some("hello"));
        assert!(composer.is_disabled());

        composer.finish(&Ok::<_, ChatError>("m1".to_string()));
        assert!(!composer.is_disabled());
        assert_eq!(composer.draft(), "");
    }

    #[test]
    fn keeps_draft_after_write_failure() {
        let mut composer = Composer::new();
        composer.set_draft("hello");
        composer.begin();
        composer.finish::<String>(&Err(ChatError::Write {
            conversation: ConversationId::global(),
            source: StoreError::Unavailable("offline".into()),
        }));
        assert!(!composer.is_disabled());
        assert_eq!(composer.draft(), "hello");
    }

    #[test]
    fn validation_failure_reenables_input() {
        let mut composer = Composer::new();
        assert_eq!(composer.begin().as_deref(), Some(""));
        composer.finish::<String>(&Err(ValidationError::EmptyContents.into()));
        assert!(!composer.is_disabled());
    }

    #[test]
    fn locked_while_sending() {
        let mut composer = Composer::new();
        composer.set_draft("first");
        composer.begin();
        assert!(composer.begin().is_none());
        composer.set_draft("typed during send");
        assert_eq!(composer.draft(), "first");
    }
}
