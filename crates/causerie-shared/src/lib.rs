//! # causerie-shared
//!
//! Protocol and domain types shared between the Causerie relay server and
//! anything that speaks its wire format.
//!
//! The wire protocol is JSON text frames over a WebSocket, one event per
//! frame, dispatched on a `"type"` tag. [`protocol::ClientEvent`] and
//! [`protocol::ServerEvent`] are the closed sums over those tags.

pub mod constants;
pub mod message;
pub mod protocol;
pub mod types;

pub use message::{ChatMessage, MediaType};
pub use protocol::{ClientEvent, ServerEvent};
pub use types::{ChannelName, InvalidChannelName, ServerInfo};
