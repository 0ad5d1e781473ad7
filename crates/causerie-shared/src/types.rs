use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated, normalized channel name.
///
/// Normalization is trim + lower-case; registry, session and router code only
/// ever see names in this form, so lookups never miss on case or whitespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ChannelName(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("channel name is empty")]
pub struct InvalidChannelName;

impl ChannelName {
    /// Normalize a raw name, rejecting anything empty after trimming.
    pub fn parse(raw: &str) -> Result<Self, InvalidChannelName> {
        let name = raw.trim().to_lowercase();
        if name.is_empty() {
            return Err(InvalidChannelName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Public metadata of a chat server listed in the directory.
///
/// `channels` and `pfp` default when absent so documents written by older
/// versions load cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub pfp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_lowercases() {
        let name = ChannelName::parse("  Gaming ").unwrap();
        assert_eq!(name.as_str(), "gaming");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(ChannelName::parse(""), Err(InvalidChannelName));
        assert_eq!(ChannelName::parse("   "), Err(InvalidChannelName));
    }

    #[test]
    fn parse_keeps_already_normalized_names() {
        let name = ChannelName::parse("general").unwrap();
        assert_eq!(name.as_str(), "general");
    }

    #[test]
    fn server_info_defaults_missing_fields() {
        let info: ServerInfo =
            serde_json::from_str(r#"{"name":"Global Public Server","owner":"system"}"#).unwrap();
        assert!(info.channels.is_empty());
        assert!(info.pfp.is_empty());
    }
}
