//! Message-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message between two users about one advert.
///
/// Identity fields default to empty strings when the backend omits them;
/// the conversation grouper treats an empty sender/recipient/advert id as a
/// malformed record and skips it rather than failing the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub recipient_id: String,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub advert_id: String,
    #[serde(default)]
    pub advert_title: String,
    #[serde(default)]
    pub content: String,
    /// Whether the recipient has read this message. Flips false -> true once.
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A record without both participants and an advert cannot be grouped.
    pub fn is_well_formed(&self) -> bool {
        !self.sender_id.is_empty() && !self.recipient_id.is_empty() && !self.advert_id.is_empty()
    }

    /// Unread from the perspective of `user_id`: incoming and not yet read.
    /// A user's own messages are never unread to them.
    pub fn is_unread_for(&self, user_id: &str) -> bool {
        !self.read && self.sender_id != user_id
    }
}
