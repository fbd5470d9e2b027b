//! Persisted KV state: rate-limit counters and session fields.
//!
//! Same degradation rules as the account collection: unreadable state loads
//! as the default, and a failed flush must never block verification itself.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::rate_limit::RateLimitState;
use super::repository::write_atomic;
use super::session::SessionState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub rate: RateLimitState,
    pub session: SessionState,
}

pub trait StateStore: Send + Sync {
    /// Load the last persisted state; degrades to the default.
    fn load(&self) -> PersistedState;

    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> PersistedState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return PersistedState::default(),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    "failed to read engine state, starting fresh: {err}"
                );
                return PersistedState::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(
                path = %self.path.display(),
                "failed to parse engine state, starting fresh: {err}"
            );
            PersistedState::default()
        })
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, &contents)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: Mutex<PersistedState>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> PersistedState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn missing_state_loads_default() {
        let dir = tempdir().expect("tempdir");
        let store = JsonStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn state_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStateStore::new(dir.path().join("state.json"));

        let mut state = PersistedState::default();
        state.rate.attempts = 3;
        state.session.start("alice", "Alice", "coach", false, 1_000, 120);
        store.save(&state)?;

        let loaded = store.load();
        assert_eq!(loaded, state);
        assert_eq!(loaded.rate.attempts, 3);
        Ok(())
    }

    #[test]
    fn corrupt_state_loads_default() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");
        fs::write(&path, "]]]")?;
        let store = JsonStateStore::new(&path);
        assert_eq!(store.load(), PersistedState::default());
        Ok(())
    }
}
