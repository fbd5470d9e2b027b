//! Account collection storage.
//!
//! The collection is loaded and replaced as a unit; there are no partial
//! updates. `save` is atomic from the caller's point of view (temp file +
//! rename), so a crash mid-serialization never leaves a half-written
//! collection behind. Read failures degrade to "no accounts" rather than
//! propagating.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use super::account::Account;
use super::error::StoreError;

pub trait AccountRepository: Send + Sync {
    /// The whole collection. A failed or unparseable read is an empty vec.
    fn all(&self) -> Vec<Account>;

    /// Replace the whole collection atomically.
    fn save(&self, accounts: &[Account]) -> Result<(), StoreError>;
}

/// Exact-match lookup by username. No case folding; only the break-glass
/// identities ever case-fold.
pub fn find_account<'a>(accounts: &'a mut [Account], username: &str) -> Option<&'a mut Account> {
    accounts
        .iter_mut()
        .find(|account| account.username == username)
}

/// Write-then-rename so readers only ever observe a complete file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).map_err(|source| StoreError::Write {
        path: tmp.display().to_string(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Production store: one JSON array per data directory.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AccountRepository for JsonFileRepository {
    fn all(&self) -> Vec<Account> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    "failed to read account collection, treating as empty: {err}"
                );
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    "failed to parse account collection, treating as empty: {err}"
                );
                Vec::new()
            }
        }
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(accounts)?;
        write_atomic(&self.path, &contents)
    }
}

/// In-memory store for tests and hosts without a data directory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: Mutex<Vec<Account>>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seeded(accounts: Vec<Account>) -> Self {
        Self {
            inner: Mutex::new(accounts),
        }
    }
}

impl AccountRepository for MemoryRepository {
    fn all(&self) -> Vec<Account> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = accounts.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let repo = JsonFileRepository::new(dir.path().join("accounts.json"));
        assert!(repo.all().is_empty());
    }

    #[test]
    fn corrupt_file_reads_as_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("accounts.json");
        fs::write(&path, "{ not json")?;
        let repo = JsonFileRepository::new(&path);
        assert!(repo.all().is_empty());
        Ok(())
    }

    #[test]
    fn save_and_reload_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("accounts.json");
        let repo = JsonFileRepository::new(&path);

        let accounts = vec![Account::new("alice", "Alice"), Account::new("bob", "Bob")];
        repo.save(&accounts)?;

        let loaded = repo.all();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].username, "alice");
        assert_eq!(loaded[1].username, "bob");
        // No temp file left behind after the rename.
        assert!(!dir.path().join("accounts.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn find_account_is_exact_match() {
        let mut accounts = vec![Account::new("Alice", "Alice")];
        assert!(find_account(&mut accounts, "Alice").is_some());
        assert!(find_account(&mut accounts, "alice").is_none());
        assert!(find_account(&mut accounts, "Alice ").is_none());
    }

    #[test]
    fn memory_repository_round_trip() -> Result<()> {
        let repo = MemoryRepository::seeded(vec![Account::new("alice", "Alice")]);
        let mut accounts = repo.all();
        accounts.push(Account::new("bob", "Bob"));
        repo.save(&accounts)?;
        assert_eq!(repo.all().len(), 2);
        Ok(())
    }
}
