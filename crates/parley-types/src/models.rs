use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_SECOND: i32 = 1_000_000_000;
const DIRECT_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub photo_url: String,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        photo_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            photo_url: photo_url.into(),
        }
    }
}

/// Wall-clock instant attached to a message at submission.
///
/// Field order matters: the derived `Ord` compares seconds first, then nanos.
///
/// Decoding goes through [`Timestamp::new`], so stored values with nanos
/// outside `0..1_000_000_000` are carried into seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "StoredTimestamp")]
pub struct Timestamp {
    pub seconds: i64,
    #[serde(rename = "nanoseconds")]
    pub nanos: i32,
}

impl Timestamp {
    /// Build a timestamp, carrying out-of-range nanos into seconds.
    pub fn new(seconds: i64, nanos: i32) -> Self {
        let carry = nanos.div_euclid(NANOS_PER_SECOND);
        Self {
            seconds: seconds.saturating_add(i64::from(carry)),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND),
        }
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        // subsec_nanos is < 2e9 even with a leap second, fits in i32
        Self::new(dt.timestamp(), dt.timestamp_subsec_nanos() as i32)
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::from_timestamp(self.seconds, nanos)
    }

    /// The smallest timestamp strictly after this one.
    pub fn next(&self) -> Self {
        Self::new(self.seconds, self.nanos + 1)
    }
}

/// Timestamp exactly as written to the store.
#[derive(Deserialize)]
struct StoredTimestamp {
    seconds: i64,
    nanoseconds: i32,
}

impl From<StoredTimestamp> for Timestamp {
    fn from(raw: StoredTimestamp) -> Self {
        Self::new(raw.seconds, raw.nanoseconds)
    }
}

/// A message as the presentation layer sees it.
///
/// Messages are immutable once written; the store document id doubles as the
/// message id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author_id: String,
    pub author_display_name: String,
    pub author_photo_url: String,
    pub contents: String,
    pub time: Timestamp,
}

impl Message {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationIdError {
    #[error("conversation id is empty")]
    Empty,
    #[error("conversation id must not contain '/'")]
    ContainsSeparator,
    #[error("user id '{0}' cannot be part of a direct conversation id")]
    AmbiguousMember(String),
}

/// Grouping key for messages: either a pair of users or the shared room.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    pub const GLOBAL: &'static str = "global";

    pub fn new(id: impl Into<String>) -> Result<Self, ConversationIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ConversationIdError::Empty);
        }
        if id.contains('/') {
            return Err(ConversationIdError::ContainsSeparator);
        }
        Ok(Self(id))
    }

    /// The shared room every signed-in user can post to.
    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    /// Per-pair conversation. Symmetric, so both participants derive the same id.
    pub fn direct(a: &str, b: &str) -> Result<Self, ConversationIdError> {
        if a.is_empty() || b.is_empty() {
            return Err(ConversationIdError::Empty);
        }
        // ':' joins the pair, so it must not occur inside either id
        if let Some(bad) = [a, b].into_iter().find(|id| id.contains(DIRECT_SEPARATOR)) {
            return Err(ConversationIdError::AmbiguousMember(bad.to_string()));
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self::new(format!("{lo}{DIRECT_SEPARATOR}{hi}"))
    }

    pub fn is_global(&self) -> bool {
        self.0 == Self::GLOBAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ConversationIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Global,
}

/// A conversation together with the users registered under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub members: Vec<User>,
}
