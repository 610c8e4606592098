//! Conversation grouping and unread tracking.
//!
//! The backend exposes messages as one flat list. Everything conversational
//! is derived client-side: messages are grouped per (counterpart, advert)
//! pair and the unread count is recomputed from zero on every pass, so a
//! rebuild from the authoritative list is always idempotent and never drifts
//! against a previous cached value.

pub mod poller;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::Message;

/// Derivation key of a conversation: the other participant plus the advert
/// being discussed. A conversation has no identity beyond this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub counterpart_id: String,
    pub advert_id: String,
}

impl ConversationKey {
    pub fn new(counterpart_id: impl Into<String>, advert_id: impl Into<String>) -> Self {
        Self {
            counterpart_id: counterpart_id.into(),
            advert_id: advert_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.counterpart_id, self.advert_id)
    }
}

/// One derived conversation: all messages between the current user and one
/// counterpart about one advert, in chronological order.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub key: ConversationKey,
    /// Display name of the counterpart, empty if no message carried one.
    pub counterpart_name: String,
    /// Advert title, empty if no message carried one.
    pub advert_title: String,
    /// Ascending by `created_at`.
    pub messages: Vec<Message>,
    /// Incoming messages still marked unread. Recomputed every rebuild.
    pub unread_count: u32,
}

impl Conversation {
    fn new(key: ConversationKey) -> Self {
        Self {
            key,
            counterpart_name: String::new(),
            advert_title: String::new(),
            messages: Vec::new(),
            unread_count: 0,
        }
    }

    /// Chronologically latest message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message().map(|m| m.created_at)
    }

    /// Counterpart name with id fallback for display.
    pub fn counterpart_label(&self) -> &str {
        if self.counterpart_name.is_empty() {
            &self.key.counterpart_id
        } else {
            &self.counterpart_name
        }
    }

    /// Advert title with id fallback for display.
    pub fn advert_label(&self) -> &str {
        if self.advert_title.is_empty() {
            &self.key.advert_id
        } else {
            &self.advert_title
        }
    }
}

/// Counterpart of a message relative to `user_id`: the recipient for
/// outgoing messages, the sender otherwise. Returns (id, display name).
fn counterpart_of<'a>(msg: &'a Message, user_id: &str) -> (&'a str, &'a str) {
    if msg.sender_id == user_id {
        (&msg.recipient_id, &msg.recipient_name)
    } else {
        (&msg.sender_id, &msg.sender_name)
    }
}

/// Group a flat message list into conversations for `current_user_id`.
///
/// The input is explicitly sorted by `created_at` (ascending, stable) before
/// grouping -- the backend's ordering is not trusted, so `last_message` is
/// always the true chronological latest. Malformed records and self-messages
/// are skipped; every surviving message lands in exactly one conversation.
/// The returned list is ordered by last activity, newest conversation first.
pub fn group_messages(messages: &[Message], current_user_id: &str) -> Vec<Conversation> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|m| m.created_at);

    let mut grouped: HashMap<ConversationKey, Conversation> = HashMap::new();
    let mut first_seen: Vec<ConversationKey> = Vec::new();

    for msg in ordered {
        if !msg.is_well_formed() {
            tracing::warn!(
                "Skipping malformed message record {} (missing sender/recipient/advert)",
                msg.id
            );
            continue;
        }
        // A message from the user to themselves has no counterpart.
        if msg.sender_id == current_user_id && msg.recipient_id == current_user_id {
            continue;
        }

        let (counterpart_id, counterpart_name) = counterpart_of(msg, current_user_id);
        let key = ConversationKey::new(counterpart_id, msg.advert_id.clone());

        let conversation = grouped.entry(key.clone()).or_insert_with(|| {
            first_seen.push(key.clone());
            Conversation::new(key)
        });

        if conversation.counterpart_name.is_empty() && !counterpart_name.is_empty() {
            conversation.counterpart_name = counterpart_name.to_string();
        }
        if conversation.advert_title.is_empty() && !msg.advert_title.is_empty() {
            conversation.advert_title = msg.advert_title.clone();
        }
        if msg.is_unread_for(current_user_id) {
            conversation.unread_count += 1;
        }
        conversation.messages.push(msg.clone());
    }

    // Drain in first-seen order so equal timestamps stay deterministic,
    // then newest activity first.
    let mut conversations: Vec<Conversation> = first_seen
        .into_iter()
        .filter_map(|key| grouped.remove(&key))
        .collect();
    conversations.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
    conversations
}

/// Look up a conversation by key after a rebuild. Conversations are
/// recreated from scratch on every pass, so callers must re-resolve by key,
/// never hold on to a previous pass's object.
pub fn find_by_key<'a>(
    conversations: &'a [Conversation],
    key: &ConversationKey,
) -> Option<&'a Conversation> {
    conversations.iter().find(|c| &c.key == key)
}

/// Optimistically flip the `read` flag on the incoming unread messages of
/// one conversation in the flat list, returning the ids of the messages
/// flipped so the caller can acknowledge each one against the backend.
///
/// The next full rebuild re-derives unread counts from the flat list, so an
/// acknowledgement that fails server-side self-heals on a later poll.
pub fn mark_read_locally(
    messages: &mut [Message],
    key: &ConversationKey,
    current_user_id: &str,
) -> Vec<String> {
    let mut flipped = Vec::new();
    for msg in messages.iter_mut() {
        if !msg.is_well_formed() || !msg.is_unread_for(current_user_id) {
            continue;
        }
        let (counterpart_id, _) = counterpart_of(msg, current_user_id);
        if counterpart_id == key.counterpart_id && msg.advert_id == key.advert_id {
            msg.read = true;
            flipped.push(msg.id.clone());
        }
    }
    flipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ME: &str = "user-me";

    fn message(
        id: &str,
        sender: &str,
        recipient: &str,
        advert: &str,
        read: bool,
        minute: u32,
    ) -> Message {
        Message {
            id: id.to_string(),
            sender_id: sender.to_string(),
            sender_name: format!("{} name", sender),
            recipient_id: recipient.to_string(),
            recipient_name: format!("{} name", recipient),
            advert_id: advert.to_string(),
            advert_title: format!("{} title", advert),
            content: format!("content of {}", id),
            read,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_partition_every_message_in_exactly_one_conversation() {
        let messages = vec![
            message("m1", "alice", ME, "ad-1", false, 0),
            message("m2", ME, "alice", "ad-1", true, 1),
            message("m3", "bob", ME, "ad-1", false, 2),
            message("m4", "alice", ME, "ad-2", false, 3),
        ];

        let conversations = group_messages(&messages, ME);
        let total: usize = conversations.iter().map(|c| c.messages.len()).sum();
        assert_eq!(total, messages.len());

        // No message id appears under two keys.
        let mut seen = std::collections::HashSet::new();
        for conv in &conversations {
            for msg in &conv.messages {
                assert!(seen.insert(msg.id.clone()), "{} grouped twice", msg.id);
            }
        }
    }

    #[test]
    fn test_spec_example_two_messages_one_conversation() {
        let messages = vec![
            message("m1", "alice", ME, "ad-x", false, 0),
            message("m2", ME, "alice", "ad-x", true, 1),
        ];

        let conversations = group_messages(&messages, ME);
        assert_eq!(conversations.len(), 1);
        let conv = &conversations[0];
        assert_eq!(conv.key, ConversationKey::new("alice", "ad-x"));
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.unread_count, 1);
    }

    #[test]
    fn test_unread_never_counts_own_messages() {
        // An own message with read=false must not count as unread.
        let messages = vec![
            message("m1", ME, "alice", "ad-1", false, 0),
            message("m2", "alice", ME, "ad-1", false, 1),
            message("m3", "alice", ME, "ad-1", true, 2),
        ];

        let conversations = group_messages(&messages, ME);
        assert_eq!(conversations[0].unread_count, 1);
    }

    #[test]
    fn test_same_counterpart_different_adverts_split() {
        let messages = vec![
            message("m1", "alice", ME, "ad-1", false, 0),
            message("m2", "alice", ME, "ad-2", false, 1),
        ];

        let conversations = group_messages(&messages, ME);
        assert_eq!(conversations.len(), 2);
    }

    #[test]
    fn test_self_messages_excluded() {
        let messages = vec![
            message("m1", ME, ME, "ad-1", false, 0),
            message("m2", "alice", ME, "ad-1", false, 1),
        ];

        let conversations = group_messages(&messages, ME);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].messages.len(), 1);
        assert_eq!(conversations[0].messages[0].id, "m2");
    }

    #[test]
    fn test_malformed_records_skipped_not_fatal() {
        let mut broken = message("m1", "", ME, "ad-1", false, 0);
        broken.sender_id.clear();
        let messages = vec![
            broken,
            message("m2", "alice", ME, "", false, 1),
            message("m3", "alice", ME, "ad-1", false, 2),
        ];

        let conversations = group_messages(&messages, ME);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].messages.len(), 1);
        assert_eq!(conversations[0].messages[0].id, "m3");
    }

    #[test]
    fn test_unordered_input_is_sorted_before_grouping() {
        // Reverse-chronological input; last_message must still be the
        // chronologically latest, not the last list element.
        let messages = vec![
            message("late", "alice", ME, "ad-1", false, 30),
            message("early", "alice", ME, "ad-1", true, 0),
            message("mid", ME, "alice", "ad-1", true, 15),
        ];

        let conversations = group_messages(&messages, ME);
        let conv = &conversations[0];
        let ids: Vec<&str> = conv.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
        assert_eq!(conv.last_message().unwrap().id, "late");
    }

    #[test]
    fn test_regrouping_is_idempotent() {
        let messages = vec![
            message("m1", "alice", ME, "ad-1", false, 0),
            message("m2", "bob", ME, "ad-2", false, 1),
            message("m3", ME, "alice", "ad-1", true, 2),
        ];

        let first = group_messages(&messages, ME);
        let second = group_messages(&messages, ME);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.unread_count, b.unread_count);
            let a_ids: Vec<&str> = a.messages.iter().map(|m| m.id.as_str()).collect();
            let b_ids: Vec<&str> = b.messages.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(a_ids, b_ids);
        }
    }

    #[test]
    fn test_conversations_ordered_by_last_activity() {
        let messages = vec![
            message("m1", "alice", ME, "ad-1", true, 0),
            message("m2", "bob", ME, "ad-2", true, 40),
            message("m3", "carol", ME, "ad-3", true, 20),
        ];

        let conversations = group_messages(&messages, ME);
        let counterparts: Vec<&str> = conversations
            .iter()
            .map(|c| c.key.counterpart_id.as_str())
            .collect();
        assert_eq!(counterparts, vec!["bob", "carol", "alice"]);
    }

    #[test]
    fn test_mark_read_then_regroup_drops_unread_by_flipped_count() {
        let mut messages = vec![
            message("m1", "alice", ME, "ad-1", false, 0),
            message("m2", "alice", ME, "ad-1", false, 1),
            message("m3", "bob", ME, "ad-2", false, 2),
        ];
        let before = group_messages(&messages, ME);
        let alice = find_by_key(&before, &ConversationKey::new("alice", "ad-1")).unwrap();
        assert_eq!(alice.unread_count, 2);

        let flipped = mark_read_locally(
            &mut messages,
            &ConversationKey::new("alice", "ad-1"),
            ME,
        );
        assert_eq!(flipped.len(), 2);

        let after = group_messages(&messages, ME);
        let alice = find_by_key(&after, &ConversationKey::new("alice", "ad-1")).unwrap();
        assert_eq!(alice.unread_count, 0);
        // Other conversations untouched.
        let bob = find_by_key(&after, &ConversationKey::new("bob", "ad-2")).unwrap();
        assert_eq!(bob.unread_count, 1);
    }

    #[test]
    fn test_mark_read_skips_own_outgoing_messages() {
        let mut messages = vec![message("m1", ME, "alice", "ad-1", false, 0)];
        let flipped = mark_read_locally(
            &mut messages,
            &ConversationKey::new("alice", "ad-1"),
            ME,
        );
        assert!(flipped.is_empty());
        assert!(!messages[0].read);
    }

    #[test]
    fn test_key_string_form() {
        let key = ConversationKey::new("user-7", "ad-42");
        assert_eq!(key.to_string(), "user-7-ad-42");
    }
}
