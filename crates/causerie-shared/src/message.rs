use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Process-wide tie-breaker so two messages minted in the same millisecond
/// still get distinct ids.
static NEXT_MESSAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// A single chat message as stored in a channel's history and sent on the
/// wire.
///
/// `likes` defaults to zero and the media fields are optional so snapshots
/// written before those fields existed still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub likes: u64,
}

impl ChatMessage {
    /// Build a new message with a fresh id and zero likes.
    ///
    /// The id is the millisecond UTC timestamp joined with an atomic
    /// per-process counter: monotonic-ish, and collision-free for the
    /// lifetime of the server process.
    pub fn new(
        user: String,
        text: String,
        media: Option<String>,
        media_type: Option<MediaType>,
    ) -> Self {
        let seq = NEXT_MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{}", Utc::now().timestamp_millis(), seq);

        Self {
            id,
            user,
            text,
            media,
            media_type,
            likes: 0,
        }
    }
}
