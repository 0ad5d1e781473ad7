//! In-memory channel registry and message histories.
//!
//! [`ChannelHistories`] is the authoritative chat state: an ordered mapping
//! from normalized channel name to its bounded, insertion-ordered message
//! list. The router mutates it inside its critical section and enqueues a
//! clone for persistence afterwards.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use causerie_shared::constants::{DEFAULT_CHANNEL, HISTORY_CAP};
use causerie_shared::{ChannelName, ChatMessage};

use crate::error::RegistryError;

/// All channels and their message histories.
///
/// A `BTreeMap` keeps listing order stable within a process lifetime and
/// across restarts (JSON object key order follows map order on both save and
/// load).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChannelHistories {
    channels: BTreeMap<String, VecDeque<ChatMessage>>,
}

impl ChannelHistories {
    /// A fresh store containing exactly the empty default channel.
    ///
    /// Used when the snapshot file is missing or unreadable, so the process
    /// never starts without a usable default channel.
    pub fn bootstrap() -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(DEFAULT_CHANNEL.to_string(), VecDeque::new());
        Self { channels }
    }

    /// Whether a channel with this (normalized) name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// All channel names in store key order.
    pub fn list(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    /// Add an empty channel.
    pub fn create(&mut self, name: &ChannelName) -> Result<(), RegistryError> {
        if self.channels.contains_key(name.as_str()) {
            return Err(RegistryError::AlreadyExists(name.as_str().to_string()));
        }
        self.channels.insert(name.as_str().to_string(), VecDeque::new());
        Ok(())
    }

    /// Remove a channel and its history. The default channel is rejected
    /// unconditionally.
    pub fn delete(&mut self, name: &ChannelName) -> Result<(), RegistryError> {
        if name.as_str() == DEFAULT_CHANNEL {
            return Err(RegistryError::Protected);
        }
        if self.channels.remove(name.as_str()).is_none() {
            return Err(RegistryError::NotFound(name.as_str().to_string()));
        }
        Ok(())
    }

    /// Create the channel if it does not exist yet. Returns `true` when a
    /// new channel was added (implicit-creation policy).
    pub fn ensure(&mut self, name: &ChannelName) -> bool {
        self.create(name).is_ok()
    }

    /// Append a message to a channel, evicting the oldest message once the
    /// history exceeds [`HISTORY_CAP`]. Returns `false` if the channel does
    /// not exist (the message is dropped, nothing mutates).
    pub fn append(&mut self, channel: &str, message: ChatMessage) -> bool {
        let Some(messages) = self.channels.get_mut(channel) else {
            return false;
        };
        messages.push_back(message);
        while messages.len() > HISTORY_CAP {
            messages.pop_front();
        }
        true
    }

    /// Increment the like counter of one message. Returns the new count, or
    /// `None` when the channel or message id is unknown (no-op).
    pub fn like(&mut self, channel: &str, message_id: &str) -> Option<u64> {
        let messages = self.channels.get_mut(channel)?;
        let message = messages.iter_mut().find(|m| m.id == message_id)?;
        message.likes += 1;
        Some(message.likes)
    }

    /// The last `n` messages of a channel, oldest first. Empty for unknown
    /// channels.
    pub fn tail(&self, channel: &str, n: usize) -> Vec<ChatMessage> {
        let Some(messages) = self.channels.get(channel) else {
            return Vec::new();
        };
        let skip = messages.len().saturating_sub(n);
        messages.iter().skip(skip).cloned().collect()
    }

    /// Full history of a channel, oldest first.
    pub fn full(&self, channel: &str) -> Vec<ChatMessage> {
        self.channels
            .get(channel)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of messages currently retained for a channel.
    pub fn len_of(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, VecDeque::len)
    }
}

impl Default for ChannelHistories {
    fn default() -> Self {
        Self::bootstrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::new("tester".into(), text.into(), None, None)
    }

    fn name(raw: &str) -> ChannelName {
        ChannelName::parse(raw).unwrap()
    }

    #[test]
    fn bootstrap_contains_only_default_channel() {
        let store = ChannelHistories::bootstrap();
        assert_eq!(store.list(), vec![DEFAULT_CHANNEL.to_string()]);
        assert_eq!(store.len_of(DEFAULT_CHANNEL), 0);
    }

    #[test]
    fn create_rejects_duplicates() {
        let mut store = ChannelHistories::bootstrap();
        store.create(&name("gaming")).unwrap();
        assert_eq!(
            store.create(&name(" GAMING ")),
            Err(RegistryError::AlreadyExists("gaming".into()))
        );
    }

    #[test]
    fn delete_protects_default_channel() {
        let mut store = ChannelHistories::bootstrap();
        assert_eq!(store.delete(&name(DEFAULT_CHANNEL)), Err(RegistryError::Protected));
        assert!(store.contains(DEFAULT_CHANNEL));
    }

    #[test]
    fn delete_unknown_channel_is_not_found() {
        let mut store = ChannelHistories::bootstrap();
        assert_eq!(
            store.delete(&name("nope")),
            Err(RegistryError::NotFound("nope".into()))
        );
    }

    #[test]
    fn append_caps_history_fifo() {
        let mut store = ChannelHistories::bootstrap();
        for i in 0..HISTORY_CAP + 5 {
            assert!(store.append(DEFAULT_CHANNEL, msg(&format!("m{i}"))));
        }
        assert_eq!(store.len_of(DEFAULT_CHANNEL), HISTORY_CAP);

        // The oldest five are gone, the rest survive in insertion order.
        let history = store.full(DEFAULT_CHANNEL);
        assert_eq!(history.first().unwrap().text, "m5");
        assert_eq!(history.last().unwrap().text, format!("m{}", HISTORY_CAP + 4));
    }

    #[test]
    fn append_to_unknown_channel_is_dropped() {
        let mut store = ChannelHistories::bootstrap();
        assert!(!store.append("ghost", msg("lost")));
        assert!(!store.contains("ghost"));
    }

    #[test]
    fn like_increments_exactly_one_message() {
        let mut store = ChannelHistories::bootstrap();
        let a = msg("a");
        let b = msg("b");
        let (id_a, id_b) = (a.id.clone(), b.id.clone());
        store.append(DEFAULT_CHANNEL, a);
        store.append(DEFAULT_CHANNEL, b);

        assert_eq!(store.like(DEFAULT_CHANNEL, &id_a), Some(1));
        assert_eq!(store.like(DEFAULT_CHANNEL, &id_a), Some(2));

        let history = store.full(DEFAULT_CHANNEL);
        assert_eq!(history.iter().find(|m| m.id == id_a).unwrap().likes, 2);
        assert_eq!(history.iter().find(|m| m.id == id_b).unwrap().likes, 0);
    }

    #[test]
    fn like_unknown_message_is_noop() {
        let mut store = ChannelHistories::bootstrap();
        store.append(DEFAULT_CHANNEL, msg("only"));
        assert_eq!(store.like(DEFAULT_CHANNEL, "missing"), None);
        assert_eq!(store.like("ghost", "missing"), None);
        assert_eq!(store.full(DEFAULT_CHANNEL)[0].likes, 0);
    }

    #[test]
    fn tail_returns_trailing_chunk_oldest_first() {
        let mut store = ChannelHistories::bootstrap();
        for i in 0..20 {
            store.append(DEFAULT_CHANNEL, msg(&format!("m{i}")));
        }
        let chunk = store.tail(DEFAULT_CHANNEL, 15);
        assert_eq!(chunk.len(), 15);
        assert_eq!(chunk.first().unwrap().text, "m5");
        assert_eq!(chunk.last().unwrap().text, "m19");

        // Shorter histories come back whole.
        assert_eq!(store.tail(DEFAULT_CHANNEL, 100).len(), 20);
        assert!(store.tail("ghost", 15).is_empty());
    }

    #[test]
    fn list_is_in_key_order() {
        let mut store = ChannelHistories::bootstrap();
        store.create(&name("zebra")).unwrap();
        store.create(&name("alpha")).unwrap();
        assert_eq!(store.list(), vec!["alpha", "general", "zebra"]);
    }
}
