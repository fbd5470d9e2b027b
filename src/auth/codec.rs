//! Hash codec: one canonical in-memory record, two serialization adapters.
//!
//! Stored credential material arrives in three historical shapes. This module
//! classifies an account into a canonical `Pbkdf2Record` regardless of shape
//! and serializes a record back into both the structured fields and the
//! composite `pbkdf2$<iterations>$<saltHex>$<hashHex>` string, so the two
//! representations can never drift apart. Pure data transformation, no I/O.

use regex::Regex;
use std::sync::OnceLock;

use super::account::{Account, HashMethod};

/// Canonical PBKDF2 credential material. Hex is lowercase internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pbkdf2Record {
    pub iterations: u32,
    pub salt_hex: String,
    pub hash_hex: String,
}

/// The three hash tiers, strongest first. Illegal combinations (PBKDF2 with
/// an empty salt, a keyed digest with iterations) are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashRecord {
    Pbkdf2(Pbkdf2Record),
    LegacyKeyed { digest_hex: String },
    LegacyWeak { blob: String },
}

impl HashRecord {
    #[must_use]
    pub fn tier_name(&self) -> &'static str {
        match self {
            Self::Pbkdf2(_) => "pbkdf2",
            Self::LegacyKeyed { .. } => "sha256-legacy",
            Self::LegacyWeak { .. } => "base64-legacy",
        }
    }

    #[must_use]
    pub fn is_strong(&self) -> bool {
        matches!(self, Self::Pbkdf2(_))
    }
}

// Hex is case-insensitive on read, lowercase on write.
const COMPOSITE_GRAMMAR: &str = r"^pbkdf2\$(\d+)\$([0-9a-fA-F]+)\$([0-9a-fA-F]+)$";

fn composite_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COMPOSITE_GRAMMAR).ok()).as_ref()
}

/// Parse the composite single-field form.
#[must_use]
pub fn parse_composite(value: &str) -> Option<Pbkdf2Record> {
    let caps = composite_regex()?.captures(value.trim())?;
    let iterations = caps.get(1)?.as_str().parse::<u32>().ok()?;
    if iterations == 0 {
        return None;
    }
    Some(Pbkdf2Record {
        iterations,
        salt_hex: caps.get(2)?.as_str().to_lowercase(),
        hash_hex: caps.get(3)?.as_str().to_lowercase(),
    })
}

/// Emit the composite single-field form.
#[must_use]
pub fn composite(record: &Pbkdf2Record) -> String {
    format!(
        "pbkdf2${}${}${}",
        record.iterations,
        record.salt_hex.to_lowercase(),
        record.hash_hex.to_lowercase()
    )
}

/// Classify an account's stored material into a canonical record.
///
/// Structured fields win when fully populated; otherwise the composite
/// string is parsed. `None` means no PBKDF2 material is usable and the
/// legacy tiers are the only option.
#[must_use]
pub fn extract(account: &Account) -> Option<Pbkdf2Record> {
    if account.is_canonical() {
        return Some(Pbkdf2Record {
            iterations: account.iterations,
            salt_hex: account.salt.to_lowercase(),
            hash_hex: account.hash.to_lowercase(),
        });
    }
    parse_composite(&account.password)
}

/// Write a canonical record into every persisted representation at once.
///
/// Mutates only in memory; the caller persists with a single repository
/// write so a crash never leaves the two forms inconsistent.
pub fn apply(account: &mut Account, record: &Pbkdf2Record) {
    account.hash_method = HashMethod::Pbkdf2;
    account.salt = record.salt_hex.to_lowercase();
    account.iterations = record.iterations;
    account.hash = record.hash_hex.to_lowercase();
    account.password = composite(record);
}

/// Apply any tier's record, for migrations that had to fall back.
pub fn apply_record(account: &mut Account, record: &HashRecord) {
    match record {
        HashRecord::Pbkdf2(record) => apply(account, record),
        HashRecord::LegacyKeyed { digest_hex } => {
            account.hash_method = HashMethod::Sha256Legacy;
            account.salt.clear();
            account.iterations = 0;
            account.hash = digest_hex.clone();
            account.password = digest_hex.clone();
        }
        HashRecord::LegacyWeak { blob } => {
            account.hash_method = HashMethod::Base64Legacy;
            account.salt.clear();
            account.iterations = 0;
            account.hash = blob.clone();
            account.password = blob.clone();
        }
    }
}
