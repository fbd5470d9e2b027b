//! Account records as persisted in the on-disk collection.
//!
//! Field names stay camelCase on the wire so collections written by earlier
//! versions of the tool keep parsing. The `password` field is the historical
//! single-field credential: canonical accounts carry the composite
//! `pbkdf2$<iterations>$<saltHex>$<hashHex>` string there, legacy accounts a
//! bare digest or blob.

use serde::{Deserialize, Serialize};

/// Which historical scheme produced the stored credential material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashMethod {
    #[serde(rename = "pbkdf2")]
    Pbkdf2,
    #[serde(rename = "sha256-legacy")]
    Sha256Legacy,
    #[serde(rename = "base64-legacy")]
    Base64Legacy,
    #[default]
    #[serde(rename = "", other)]
    Unset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    /// Unique, case-sensitive identity key.
    pub username: String,
    /// Display name; backfilled from the username on first login if empty.
    pub full_name: String,
    pub hash_method: HashMethod,
    /// Hex salt, present only for PBKDF2 accounts.
    pub salt: String,
    /// PBKDF2 iteration count; 0 for legacy methods.
    pub iterations: u32,
    /// Hex digest, or base64 blob for the oldest scheme.
    pub hash: String,
    /// Single-field credential kept in sync for backward-compatible readers.
    pub password: String,
    pub role: String,
    /// Unix milliseconds of the last successful verification; 0 = never.
    pub last_login: u64,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            username: String::new(),
            full_name: String::new(),
            hash_method: HashMethod::Unset,
            salt: String::new(),
            iterations: 0,
            hash: String::new(),
            password: String::new(),
            role: "coach".to_string(),
            last_login: 0,
        }
    }
}

impl Account {
    #[must_use]
    pub fn new(username: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    /// True when the structured PBKDF2 fields are fully populated.
    ///
    /// Accounts where only the composite string survived are not canonical
    /// and get normalized on their next successful login.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.hash_method == HashMethod::Pbkdf2
            && !self.salt.is_empty()
            && self.iterations > 0
            && !self.hash.is_empty()
    }
}
