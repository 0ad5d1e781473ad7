//! Per-connection session table.
//!
//! Each live WebSocket gets a [`ConnectionId`] and a [`Session`] tracking its
//! current channel, optional identity, and the sender half of its outbound
//! event queue. The table is an explicit side-table keyed by connection id;
//! nothing is ever attached to the socket itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use causerie_shared::constants::DEFAULT_CHANNEL;
use causerie_shared::ServerEvent;

/// Process-wide connection id counter.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Mint the next id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound event queue of one connection. The WebSocket writer task drains
/// the receiving half.
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;

/// Ephemeral per-connection state. Never persisted.
#[derive(Debug)]
pub struct Session {
    pub sender: OutboundSender,
    pub channel: String,
    pub user: Option<String>,
}

/// All live sessions.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh connection in the default channel.
    pub fn register(&mut self, id: ConnectionId, sender: OutboundSender) {
        self.sessions.insert(
            id,
            Session {
                sender,
                channel: DEFAULT_CHANNEL.to_string(),
                user: None,
            },
        );
    }

    /// Drop a connection's session. Idempotent.
    pub fn unregister(&mut self, id: ConnectionId) {
        self.sessions.remove(&id);
    }

    /// Unconditionally move a connection to another channel.
    pub fn set_channel(&mut self, id: ConnectionId, channel: &str) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.channel = channel.to_string();
        }
    }

    /// Record the authenticated identity of a connection.
    pub fn set_user(&mut self, id: ConnectionId, user: &str) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.user = Some(user.to_string());
        }
    }

    /// Current channel of a connection, if it is still live.
    pub fn channel_of(&self, id: ConnectionId) -> Option<&str> {
        self.sessions.get(&id).map(|s| s.channel.as_str())
    }

    /// Send one event to one connection. A closed peer is silently skipped;
    /// its reader loop is already tearing the session down.
    pub fn send_to(&self, id: ConnectionId, event: &ServerEvent) {
        if let Some(session) = self.sessions.get(&id) {
            let _ = session.sender.send(event.clone());
        }
    }

    /// Fan an event out to every live connection.
    pub fn broadcast_all(&self, event: &ServerEvent) {
        for session in self.sessions.values() {
            let _ = session.sender.send(event.clone());
        }
    }

    /// Fan an event out to every connection currently in `channel`,
    /// reflecting the table at the instant of the call.
    pub fn broadcast_channel(&self, channel: &str, event: &ServerEvent) {
        for session in self.sessions.values() {
            if session.channel == channel {
                let _ = session.sender.send(event.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(table: &mut SessionTable) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::next();
        table.register(id, tx);
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn register_defaults_to_general() {
        let mut table = SessionTable::new();
        let (id, _rx) = connect(&mut table);
        assert_eq!(table.channel_of(id), Some(DEFAULT_CHANNEL));
    }

    #[test]
    fn broadcast_channel_only_reaches_members() {
        let mut table = SessionTable::new();
        let (a, mut rx_a) = connect(&mut table);
        let (_b, mut rx_b) = connect(&mut table);
        table.set_channel(a, "gaming");

        let event = ServerEvent::Channels {
            channels: vec!["general".into()],
        };
        table.broadcast_channel("gaming", &event);

        assert_eq!(drain(&mut rx_a).len(), 1);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut table = SessionTable::new();
        let (id, _rx) = connect(&mut table);
        table.unregister(id);
        table.unregister(id);
        assert!(table.is_empty());
        assert_eq!(table.channel_of(id), None);
    }

    #[test]
    fn send_to_dropped_receiver_does_not_panic() {
        let mut table = SessionTable::new();
        let (id, rx) = connect(&mut table);
        drop(rx);
        table.send_to(
            id,
            &ServerEvent::Error {
                msg: "gone".into(),
            },
        );
    }
}
