/// Channel every new connection starts in. Protected from deletion.
pub const DEFAULT_CHANNEL: &str = "general";

/// Maximum retained messages per channel; the oldest is evicted first.
pub const HISTORY_CAP: usize = 100;

/// Number of trailing messages sent back on a `join`.
pub const HISTORY_CHUNK: usize = 15;

/// Default HTTP/WebSocket port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Maximum upload size in bytes (50 MiB).
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// File name of the persisted channel-history snapshot.
pub const HISTORY_FILE: &str = "chat_history.json";

/// File name of the persisted user/server directory.
pub const DIRECTORY_FILE: &str = "directory.json";

/// Identifier of the built-in public server entry in the directory.
pub const MAIN_SERVER_ID: &str = "MAIN";
