use thiserror::Error;

/// Errors produced when writing or reading a persisted document.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (e.g. creating the data directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation outcomes of channel-registry mutations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Name was empty after normalization.
    #[error("channel name is empty")]
    Invalid,

    /// A channel with the normalized name already exists.
    #[error("channel already exists: {0}")]
    AlreadyExists(String),

    /// No channel with that name.
    #[error("no such channel: {0}")]
    NotFound(String),

    /// The default channel cannot be deleted.
    #[error("the default channel cannot be deleted")]
    Protected,
}

impl From<causerie_shared::InvalidChannelName> for RegistryError {
    fn from(_: causerie_shared::InvalidChannelName) -> Self {
        RegistryError::Invalid
    }
}
