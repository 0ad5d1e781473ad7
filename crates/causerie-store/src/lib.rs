//! # causerie-store
//!
//! Durable state for the Causerie relay: per-channel message histories and
//! the flat-file user/server directory.
//!
//! Both documents are plain JSON written whole on every mutation. In-memory
//! state is authoritative; durability is best-effort through a background
//! writer task that the mutating code only ever enqueues to, so broadcast
//! latency never waits on disk I/O.

pub mod directory;
pub mod history;
pub mod snapshot;

mod error;

pub use directory::Directory;
pub use error::{RegistryError, StoreError};
pub use history::ChannelHistories;
pub use snapshot::DocumentWriter;
