//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use causerie_shared::constants::{
    DEFAULT_HTTP_PORT, DIRECTORY_FILE, HISTORY_FILE, MAX_UPLOAD_SIZE,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP/WebSocket server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Directory holding the persisted snapshot and directory files.
    /// Env: `DATA_DIR`
    /// Default: `./data`
    pub data_dir: PathBuf,

    /// Directory uploaded media files are written to (served at `/uploads`).
    /// Env: `UPLOADS_DIR`
    /// Default: `./data/uploads`
    pub uploads_dir: PathBuf,

    /// Directory of static client assets served at the root path.
    /// Env: `PUBLIC_DIR`
    /// Default: `./public`
    pub public_dir: PathBuf,

    /// Maximum upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 50 MiB
    pub max_upload_size: usize,

    /// Whether `join`/`message` to an unknown channel creates it on the fly.
    /// When disabled (the default), channels exist only through explicit
    /// `createChannel` and anything else is a validation failure.
    /// Env: `IMPLICIT_CHANNELS` (true/false)
    /// Default: `false`
    pub implicit_channels: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            data_dir: PathBuf::from("./data"),
            uploads_dir: PathBuf::from("./data/uploads"),
            public_dir: PathBuf::from("./public"),
            max_upload_size: MAX_UPLOAD_SIZE,
            implicit_channels: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(dir) = std::env::var("DATA_DIR") {
            config.data_dir = PathBuf::from(&dir);
            config.uploads_dir = PathBuf::from(dir).join("uploads");
        }

        if let Ok(dir) = std::env::var("UPLOADS_DIR") {
            config.uploads_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_upload_size = n;
            } else {
                tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default");
            }
        }

        if let Ok(val) = std::env::var("IMPLICIT_CHANNELS") {
            config.implicit_channels = val == "true" || val == "1";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Path of the channel-history snapshot file.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    /// Path of the user/server directory file.
    pub fn directory_path(&self) -> PathBuf {
        self.data_dir.join(DIRECTORY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into());
        assert!(!config.implicit_channels);
        assert_eq!(config.max_upload_size, MAX_UPLOAD_SIZE);
    }

    #[test]
    fn test_document_paths_live_in_data_dir() {
        let config = ServerConfig::default();
        assert_eq!(config.history_path(), PathBuf::from("./data").join(HISTORY_FILE));
        assert_eq!(
            config.directory_path(),
            PathBuf::from("./data").join(DIRECTORY_FILE)
        );
    }
}
