use std::collections::HashSet;

use parley_store::Document;
use parley_types::api::MessageDocument;
use parley_types::{FeedChange, Message};
use tracing::warn;

/// Sort messages into display order: ascending by time, ties broken by id.
///
/// The order is total over distinct ids, so the result does not depend on the
/// order the snapshot arrived in and `order(order(s)) == order(s)`.
pub fn order(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
    messages
}

/// Turn a raw snapshot into ordered messages.
///
/// Documents that fail to decode are logged and left out. If the snapshot
/// holds the same id twice, the first occurrence wins.
pub fn normalize(snapshot: Vec<Document>) -> Vec<Message> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    let mut messages = Vec::with_capacity(snapshot.len());

    for doc in snapshot {
        if !seen.insert(doc.id.clone()) {
            warn!("Duplicate message id '{}' in snapshot, keeping first", doc.id);
            continue;
        }
        match doc.decode::<MessageDocument>() {
            Ok(fields) => messages.push(fields.into_message(doc.id)),
            Err(e) => warn!("Skipping undecodable message: {}", e),
        }
    }

    order(messages)
}

/// Classify `next` against the previously published ordered list.
pub fn diff(previous: &[Message], next: &[Message]) -> FeedChange {
    let is_prefix = previous.len() <= next.len()
        && previous
            .iter()
            .zip(next)
            .all(|(prev, new)| prev.id == new.id);

    if !is_prefix {
        FeedChange::Replaced
    } else if next.len() == previous.len() {
        FeedChange::Unchanged
    } else {
        FeedChange::Appended {
            count: next.len() - previous.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use parley_types::Timestamp;
    use serde_json::json;

    use super::*;

    fn msg(id: &str, seconds: i64) -> Message {
        Message {
            id: id.into(),
            author_id: "u".into(),
            author_display_name: "U".into(),
            author_photo_url: String::new(),
            contents: format!("message {id}"),
            time: Timestamp::new(seconds, 0),
        }
    }

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    fn doc(id: &str, seconds: i64) -> Document {
        Document::new(
            id,
            json!({
                "contents": "hi",
                "displayName": "U",
                "id": "u",
                "photoURL": "",
                "time": { "seconds": seconds, "nanoseconds": 0 },
            }),
        )
    }

    #[test]
    fn orders_by_time() {
        let ordered = order(vec![msg("b", 2), msg("a", 1)]);
        assert_eq!(ids(&ordered), vec!["a", "b"]);
    }

    #[test]
    fn equal_times_fall_back_to_id() {
        let one = order(vec![msg("y", 5), msg("x", 5), msg("w", 1)]);
        let two = order(vec![msg("x", 5), msg("w", 1), msg("y", 5)]);
        assert_eq!(ids(&one), vec!["w", "x", "y"]);
        assert_eq!(one, two);
    }

    #[test]
    fn order_is_idempotent() {
        let input = vec![msg("c", 3), msg("a", 3), msg("b", 1), msg("d", 0)];
        let once = order(input);
        let twice = order(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn order_respects_nanos() {
        let mut early = msg("z", 7);
        early.time = Timestamp::new(7, 10);
        let mut late = msg("a", 7);
        late.time = Timestamp::new(7, 20);
        assert_eq!(ids(&order(vec![late, early])), vec!["z", "a"]);
    }

    #[test]
    fn normalize_drops_duplicates_and_malformed() {
        let snapshot = vec![
            doc("b", 2),
            Document::new("broken", json!({ "contents": "no time", "id": "u" })),
            doc("a", 1),
            doc("b", 9),
        ];
        let messages = normalize(snapshot);
        assert_eq!(ids(&messages), vec!["a", "b"]);
        assert_eq!(messages[1].time, Timestamp::new(2, 0));
    }

    #[test]
    fn out_of_range_nanos_sort_by_actual_time() {
        let mut late = doc("late", 1);
        late.fields["time"]["nanoseconds"] = json!(1_500_000_000);
        let mut before = doc("before", 1);
        before.fields["time"]["nanoseconds"] = json!(-1);

        let messages = normalize(vec![doc("early", 2), late, before]);
        assert_eq!(ids(&messages), vec!["before", "early", "late"]);
        assert_eq!(messages[2].time, Timestamp::new(2, 500_000_000));
        assert_eq!(messages[0].time, Timestamp::new(0, 999_999_999));
    }

    #[test]
    fn diff_classifies_changes() {
        let ab = vec![msg("a", 1), msg("b", 2)];
        let abc = vec![msg("a", 1), msg("b", 2), msg("c", 3)];
        let acb = vec![msg("a", 1), msg("c", 2), msg("b", 3)];

        assert_eq!(diff(&ab, &ab), FeedChange::Unchanged);
        assert_eq!(diff(&ab, &abc), FeedChange::Appended { count: 1 });
        assert_eq!(diff(&[], &ab), FeedChange::Appended { count: 2 });
        assert_eq!(diff(&ab, &acb), FeedChange::Replaced);
        assert_eq!(diff(&abc, &ab), FeedChange::Replaced);
    }
}
