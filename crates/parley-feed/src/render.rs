use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use parley_types::{Feed, Message};
use serde::Serialize;

/// One message laid out for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bubble {
    pub message_id: String,
    pub author_name: String,
    pub author_photo_url: String,
    pub contents: String,
    /// Sent by the viewer; drawn on the opposite side with its own colours
    pub owned: bool,
    pub created_at: DateTime<Utc>,
}

impl Bubble {
    pub fn from_message(message: &Message, viewer_id: Option<&str>) -> Self {
        Self {
            message_id: message.id.clone(),
            author_name: message.author_display_name.clone(),
            author_photo_url: message.author_photo_url.clone(),
            contents: message.contents.clone(),
            owned: viewer_id.is_some_and(|id| message.is_authored_by(id)),
            // Out-of-range timestamps render at the epoch
            created_at: message.time.to_datetime().unwrap_or_default(),
        }
    }

    /// `2024-03-07 at 09:05:01`, in the given time zone.
    pub fn time_label<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.created_at
            .with_timezone(tz)
            .format("%Y-%m-%d at %H:%M:%S")
            .to_string()
    }
}

/// Bubbles for every message in the feed, in feed order.
pub fn render(feed: &Feed, viewer_id: Option<&str>) -> Vec<Bubble> {
    feed.messages
        .iter()
        .map(|m| Bubble::from_message(m, viewer_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use parley_types::{ConversationId, FeedChange, FeedStatus, Generation, Timestamp};

    use super::*;

    fn message(id: &str, author: &str, seconds: i64) -> Message {
        Message {
            id: id.into(),
            author_id: author.into(),
            author_display_name: author.to_uppercase(),
            author_photo_url: String::new(),
            contents: "hey".into(),
            time: Timestamp::new(seconds, 0),
        }
    }

    #[test]
    fn marks_viewer_messages_as_owned() {
        let feed = Feed {
            conversation: Some(ConversationId::global()),
            generation: Generation(1),
            messages: vec![message("1", "ada", 1), message("2", "bob", 2)],
            change: FeedChange::Reset,
            status: FeedStatus::Live,
        };
        let bubbles = render(&feed, Some("ada"));
        assert!(bubbles[0].owned);
        assert!(!bubbles[1].owned);
        assert_eq!(bubbles[1].author_name, "BOB");

        assert!(render(&feed, None).iter().all(|b| !b.owned));
    }

    #[test]
    fn labels_use_one_based_months() {
        // 2024-03-07T09:05:01Z
        let bubble = Bubble::from_message(&message("1", "ada", 1_709_802_301), None);
        assert_eq!(bubble.time_label(&Utc), "2024-03-07 at 09:05:01");

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(bubble.time_label(&plus_two), "2024-03-07 at 11:05:01");
    }
}
