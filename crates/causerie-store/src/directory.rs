//! Flat-file user and server directory.
//!
//! This is the auth/db collaborator behind the router's capability
//! interface: `register`, `authenticate`, and the password digest. Passwords
//! are stored as hex-encoded BLAKE3 digests -- the directory is a
//! convenience, not a hardened credential store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use causerie_shared::constants::{DEFAULT_CHANNEL, MAIN_SERVER_ID};
use causerie_shared::ServerInfo;

/// One account: password digest plus the servers the user belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub password: String,
    #[serde(default)]
    pub servers: Vec<String>,
}

/// Outcome of a failed registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Username taken!")]
    Taken,

    #[error("Username is empty.")]
    Invalid,
}

/// The whole directory document, persisted as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Directory {
    #[serde(default)]
    users: BTreeMap<String, UserRecord>,
    #[serde(default)]
    servers: BTreeMap<String, ServerInfo>,
}

impl Directory {
    /// A fresh directory with no users and the built-in public server.
    pub fn bootstrap() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(
            MAIN_SERVER_ID.to_string(),
            ServerInfo {
                name: "Global Public Server".to_string(),
                owner: "system".to_string(),
                channels: vec![DEFAULT_CHANNEL.to_string()],
                pfp: String::new(),
            },
        );
        Self {
            users: BTreeMap::new(),
            servers,
        }
    }

    /// Create an account. The username is trimmed; empty or taken names are
    /// rejected.
    pub fn register(&mut self, user: &str, pass: &str) -> Result<(), DirectoryError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(DirectoryError::Invalid);
        }
        if self.users.contains_key(user) {
            return Err(DirectoryError::Taken);
        }

        self.users.insert(
            user.to_string(),
            UserRecord {
                password: hash_password(pass),
                servers: vec![MAIN_SERVER_ID.to_string()],
            },
        );
        Ok(())
    }

    /// Check a username/password pair against the stored digest.
    pub fn authenticate(&self, user: &str, pass: &str) -> bool {
        self.users
            .get(user.trim())
            .is_some_and(|record| record.password == hash_password(pass))
    }

    /// Server ids the user is a member of. Empty for unknown users.
    pub fn servers_for(&self, user: &str) -> Vec<String> {
        self.users
            .get(user.trim())
            .map(|record| record.servers.clone())
            .unwrap_or_default()
    }

    /// Every server listed in the directory.
    pub fn all_servers(&self) -> BTreeMap<String, ServerInfo> {
        self.servers.clone()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::bootstrap()
    }
}

/// Hex-encoded BLAKE3 digest of a password.
pub fn hash_password(pass: &str) -> String {
    hex::encode(blake3::hash(pass.as_bytes()).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_seeds_main_server() {
        let directory = Directory::bootstrap();
        let servers = directory.all_servers();
        assert!(servers.contains_key(MAIN_SERVER_ID));
        assert_eq!(servers[MAIN_SERVER_ID].owner, "system");
    }

    #[test]
    fn register_then_authenticate() {
        let mut directory = Directory::bootstrap();
        directory.register("alice", "s3cret").unwrap();

        assert!(directory.authenticate("alice", "s3cret"));
        assert!(!directory.authenticate("alice", "wrong"));
        assert!(!directory.authenticate("nobody", "s3cret"));
        assert_eq!(directory.servers_for("alice"), vec![MAIN_SERVER_ID.to_string()]);
    }

    #[test]
    fn register_trims_and_rejects_duplicates() {
        let mut directory = Directory::bootstrap();
        directory.register("  bob ", "pw").unwrap();
        assert_eq!(directory.register("bob", "other"), Err(DirectoryError::Taken));
        assert!(directory.authenticate("bob", "pw"));
    }

    #[test]
    fn register_rejects_empty_usernames() {
        let mut directory = Directory::bootstrap();
        assert_eq!(directory.register("   ", "pw"), Err(DirectoryError::Invalid));
    }

    #[test]
    fn passwords_are_stored_as_digests() {
        let mut directory = Directory::bootstrap();
        directory.register("carol", "hunter2").unwrap();
        let json = serde_json::to_string(&directory).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains(&hash_password("hunter2")));
    }

    #[test]
    fn legacy_document_without_servers_map_loads() {
        let directory: Directory = serde_json::from_str(r#"{"users":{}}"#).unwrap();
        assert!(directory.all_servers().is_empty());
    }
}
