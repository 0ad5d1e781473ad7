//! The protocol state machine: decode, validate, mutate, persist, broadcast.
//!
//! All shared chat state lives behind one mutex. Each inbound event is
//! handled start-to-finish inside that single critical section -- read
//! current state, mutate it, enqueue the snapshot, fan the resulting events
//! out -- so observers always see mutations and their broadcasts as one
//! atomic step, and per-channel broadcast order matches server-side append
//! order. Nothing inside the section awaits I/O: persistence is an enqueue
//! to the background writer, fan-out is non-blocking sends.

use tokio::sync::Mutex;
use tracing::{debug, info};

use causerie_shared::constants::HISTORY_CHUNK;
use causerie_shared::{ChannelName, ChatMessage, ClientEvent, MediaType, ServerEvent};
use causerie_store::directory::Directory;
use causerie_store::{ChannelHistories, DocumentWriter};

use crate::session::{ConnectionId, OutboundSender, SessionTable};

/// Everything the router mutates, guarded as one unit.
struct ChatCore {
    histories: ChannelHistories,
    directory: Directory,
    sessions: SessionTable,
}

/// The message router and broadcaster.
///
/// State is injected at construction; nothing here reaches for globals, so
/// tests drive it with fixture stores and in-memory sessions.
pub struct Router {
    core: Mutex<ChatCore>,
    history_writer: DocumentWriter<ChannelHistories>,
    directory_writer: DocumentWriter<Directory>,
    implicit_channels: bool,
}

impl Router {
    pub fn new(
        histories: ChannelHistories,
        directory: Directory,
        history_writer: DocumentWriter<ChannelHistories>,
        directory_writer: DocumentWriter<Directory>,
        implicit_channels: bool,
    ) -> Self {
        Self {
            core: Mutex::new(ChatCore {
                histories,
                directory,
                sessions: SessionTable::new(),
            }),
            history_writer,
            directory_writer,
            implicit_channels,
        }
    }

    /// Register a new connection in the default channel.
    pub async fn connect(&self, sender: OutboundSender) -> ConnectionId {
        let id = ConnectionId::next();
        let mut core = self.core.lock().await;
        core.sessions.register(id, sender);
        info!(connection = %id, live = core.sessions.len(), "session registered");
        id
    }

    /// Drop a connection's session. Safe to call more than once.
    pub async fn disconnect(&self, id: ConnectionId) {
        let mut core = self.core.lock().await;
        core.sessions.unregister(id);
        info!(connection = %id, live = core.sessions.len(), "session removed");
    }

    /// Handle one decoded inbound event.
    pub async fn handle(&self, id: ConnectionId, event: ClientEvent) {
        let mut core = self.core.lock().await;

        match event {
            ClientEvent::Join { channel } => self.on_join(&mut core, id, &channel),
            ClientEvent::CreateChannel { name } => self.on_create_channel(&mut core, id, &name),
            ClientEvent::DeleteChannel { name } => self.on_delete_channel(&mut core, id, &name),
            ClientEvent::Message {
                channel,
                user,
                text,
                media,
                media_type,
            } => self.on_message(&mut core, id, &channel, user, text, media, media_type),
            ClientEvent::Like {
                channel,
                message_id,
            } => self.on_like(&mut core, &channel, &message_id),
            ClientEvent::Register { user, pass } => self.on_register(&mut core, id, &user, &pass),
            ClientEvent::Login { user, pass } => self.on_login(&mut core, id, &user, &pass),
            ClientEvent::Unknown => {
                debug!(connection = %id, "ignoring unknown event kind");
            }
        }
    }

    // -------------------------------------------------------------------
    // Handlers (all run inside the critical section)
    // -------------------------------------------------------------------

    fn on_join(&self, core: &mut ChatCore, id: ConnectionId, channel: &str) {
        let Ok(name) = ChannelName::parse(channel) else {
            core.sessions.send_to(
                id,
                &ServerEvent::Error {
                    msg: "channel name is empty".to_string(),
                },
            );
            return;
        };

        if !core.histories.contains(name.as_str())
            && !self.admit_missing_channel(core, id, &name)
        {
            return;
        }

        core.sessions.set_channel(id, name.as_str());
        let messages = core.histories.tail(name.as_str(), HISTORY_CHUNK);
        debug!(connection = %id, channel = %name, history = messages.len(), "joined channel");
        core.sessions.send_to(
            id,
            &ServerEvent::History {
                channel: name.into_string(),
                messages,
            },
        );
    }

    fn on_create_channel(&self, core: &mut ChatCore, id: ConnectionId, raw: &str) {
        let name = match ChannelName::parse(raw) {
            Ok(name) => name,
            Err(e) => {
                core.sessions.send_to(id, &ServerEvent::Error { msg: e.to_string() });
                return;
            }
        };

        match core.histories.create(&name) {
            Ok(()) => {
                info!(channel = %name, "channel created");
                self.persist_history(core);
                self.broadcast_channel_list(core);
                core.sessions.send_to(
                    id,
                    &ServerEvent::ChannelCreated {
                        name: name.into_string(),
                    },
                );
            }
            Err(e) => {
                core.sessions.send_to(id, &ServerEvent::Error { msg: e.to_string() });
            }
        }
    }

    fn on_delete_channel(&self, core: &mut ChatCore, id: ConnectionId, raw: &str) {
        let name = match ChannelName::parse(raw) {
            Ok(name) => name,
            Err(e) => {
                core.sessions.send_to(id, &ServerEvent::Error { msg: e.to_string() });
                return;
            }
        };

        match core.histories.delete(&name) {
            Ok(()) => {
                info!(channel = %name, "channel deleted");
                self.persist_history(core);
                self.broadcast_channel_list(core);
                core.sessions.send_to(
                    id,
                    &ServerEvent::ChannelDeleted {
                        name: name.into_string(),
                    },
                );
            }
            Err(e) => {
                // Protected or unknown: registry unchanged, no broadcast.
                core.sessions.send_to(id, &ServerEvent::Error { msg: e.to_string() });
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn on_message(
        &self,
        core: &mut ChatCore,
        id: ConnectionId,
        channel: &str,
        user: String,
        text: String,
        media: Option<String>,
        media_type: Option<MediaType>,
    ) {
        let Ok(name) = ChannelName::parse(channel) else {
            debug!(connection = %id, "dropping message to empty channel name");
            return;
        };

        if !core.histories.contains(name.as_str())
            && !self.admit_missing_channel(core, id, &name)
        {
            return;
        }

        let message = ChatMessage::new(user, text, media, media_type);
        let event = ServerEvent::Message {
            message: message.clone(),
        };

        core.histories.append(name.as_str(), message);
        self.persist_history(core);
        core.sessions.broadcast_channel(name.as_str(), &event);
    }

    fn on_like(&self, core: &mut ChatCore, channel: &str, message_id: &str) {
        let Ok(name) = ChannelName::parse(channel) else {
            return;
        };

        // Unknown channel or id: no mutation, no broadcast.
        if let Some(likes) = core.histories.like(name.as_str(), message_id) {
            self.persist_history(core);
            core.sessions.broadcast_channel(
                name.as_str(),
                &ServerEvent::UpdateLikes {
                    id: message_id.to_string(),
                    likes,
                },
            );
        }
    }

    fn on_register(&self, core: &mut ChatCore, id: ConnectionId, user: &str, pass: &str) {
        let user = user.trim().to_string();
        match core.directory.register(&user, pass) {
            Ok(()) => {
                info!(user = %user, "account registered");
                self.directory_writer.enqueue(core.directory.clone());
                self.auth_success(core, id, &user);
            }
            Err(e) => {
                core.sessions.send_to(id, &ServerEvent::AuthError { msg: e.to_string() });
            }
        }
    }

    fn on_login(&self, core: &mut ChatCore, id: ConnectionId, user: &str, pass: &str) {
        let user = user.trim().to_string();
        if core.directory.authenticate(&user, pass) {
            info!(user = %user, "login succeeded");
            self.auth_success(core, id, &user);
        } else {
            core.sessions.send_to(
                id,
                &ServerEvent::AuthError {
                    msg: "Invalid credentials.".to_string(),
                },
            );
        }
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    /// Apply the channel-creation policy for a `join`/`message` naming a
    /// channel the registry does not have. Returns `true` if the channel is
    /// now admitted, `false` if the event must be rejected.
    fn admit_missing_channel(
        &self,
        core: &mut ChatCore,
        id: ConnectionId,
        name: &ChannelName,
    ) -> bool {
        if !self.implicit_channels {
            core.sessions.send_to(
                id,
                &ServerEvent::Error {
                    msg: format!("no such channel: {name}"),
                },
            );
            return false;
        }

        if core.histories.ensure(name) {
            info!(channel = %name, "channel created implicitly");
            self.persist_history(core);
            self.broadcast_channel_list(core);
        }
        true
    }

    fn broadcast_channel_list(&self, core: &ChatCore) {
        core.sessions.broadcast_all(&ServerEvent::Channels {
            channels: core.histories.list(),
        });
    }

    fn persist_history(&self, core: &ChatCore) {
        self.history_writer.enqueue(core.histories.clone());
    }

    fn auth_success(&self, core: &mut ChatCore, id: ConnectionId, user: &str) {
        core.sessions.set_user(id, user);
        let event = ServerEvent::AuthSuccess {
            user: user.to_string(),
            my_servers: core.directory.servers_for(user),
            all_servers: core.directory.all_servers(),
        };
        core.sessions.send_to(id, &event);
    }
}
