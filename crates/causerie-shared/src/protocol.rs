use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::message::{ChatMessage, MediaType};
use crate::types::ServerInfo;

/// Every control message a client may send over its WebSocket.
///
/// One JSON object per text frame, dispatched on the `type` field. Tags a
/// client invents that we do not know land in [`ClientEvent::Unknown`] and
/// are ignored by the router instead of killing the connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Switch this connection to a channel and request its recent history.
    Join { channel: String },

    /// Create a new, empty channel.
    CreateChannel { name: String },

    /// Delete an existing channel. The default channel is protected.
    DeleteChannel { name: String },

    /// Post a message (optionally with an uploaded media URL) to a channel.
    Message {
        channel: String,
        user: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        media: Option<String>,
        #[serde(rename = "mediaType", default)]
        media_type: Option<MediaType>,
    },

    /// Like a message in a channel. Repeat likes from the same client count.
    Like {
        channel: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },

    /// Create an account in the directory.
    Register { user: String, pass: String },

    /// Authenticate against the directory.
    Login { user: String, pass: String },

    /// Any tag we do not recognize.
    #[serde(other)]
    Unknown,
}

/// Every event the server may push to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Reply to a `join`: the trailing chunk of the channel's history.
    History {
        channel: String,
        messages: Vec<ChatMessage>,
    },

    /// A freshly posted message, fanned out to the channel's members.
    Message {
        #[serde(flatten)]
        message: ChatMessage,
    },

    /// A message's like counter changed.
    UpdateLikes { id: String, likes: u64 },

    /// The full channel list, broadcast after any registry change.
    Channels { channels: Vec<String> },

    /// Confirmation to the creator of a new channel.
    ChannelCreated { name: String },

    /// Confirmation to the deleter of a channel.
    ChannelDeleted { name: String },

    /// Registration or login succeeded.
    #[serde(rename = "auth_success")]
    AuthSuccess {
        user: String,
        #[serde(rename = "myServers")]
        my_servers: Vec<String>,
        #[serde(rename = "allServers")]
        all_servers: BTreeMap<String, ServerInfo>,
    },

    /// Registration or login failed.
    #[serde(rename = "auth_error")]
    AuthError { msg: String },

    /// Validation failure scoped to the connection that caused it.
    Error { msg: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_dispatch_on_type_tag() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"join","channel":"general"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                channel: "general".into()
            }
        );

        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"createChannel","name":"Gaming "}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::CreateChannel {
                name: "Gaming ".into()
            }
        );
    }

    #[test]
    fn message_event_carries_optional_media() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"message","channel":"general","user":"alice","text":"look",
                "media":"/uploads/cat.png","mediaType":"image"}"#,
        )
        .unwrap();
        match event {
            ClientEvent::Message {
                media, media_type, ..
            } => {
                assert_eq!(media.as_deref(), Some("/uploads/cat.png"));
                assert_eq!(media_type, Some(MediaType::Image));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_tags_deserialize_instead_of_erroring() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"teleport","dest":"moon"}"#).unwrap();
        assert_eq!(event, ClientEvent::Unknown);
    }

    #[test]
    fn like_uses_message_id_wire_name() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"like","channel":"general","messageId":"171234-0"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Like {
                channel: "general".into(),
                message_id: "171234-0".into()
            }
        );
    }

    #[test]
    fn message_broadcast_is_flattened() {
        let msg = ChatMessage::new("alice".into(), "hi".into(), None, None);
        let id = msg.id.clone();
        let json = serde_json::to_value(ServerEvent::Message { message: msg }).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["user"], "alice");
        assert_eq!(json["likes"], 0);
    }

    #[test]
    fn auth_events_use_snake_case_tags() {
        let json = serde_json::to_value(ServerEvent::AuthError {
            msg: "Invalid credentials.".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "auth_error");
    }

    #[test]
    fn update_likes_wire_shape() {
        let json = serde_json::to_value(ServerEvent::UpdateLikes {
            id: "171234-0".into(),
            likes: 3,
        })
        .unwrap();
        assert_eq!(json["type"], "updateLikes");
        assert_eq!(json["likes"], 3);
    }
}
