//! Verification engine: the one entry point callers need for login.
//!
//! Flow per attempt: empty-credential check, lockout check, break-glass
//! check, repository lookup, then the three hash tiers strongest first.
//! A legacy-tier match triggers a hash migration; a PBKDF2 match against
//! composite-only material triggers normalization. Metadata updates and
//! migrations land in a single repository write.
//!
//! The engine itself is stateless aside from its injected repository,
//! state store, crypto provider and clock; the busy flag guarantees at
//! most one in-flight verification at a time.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::task;
use tracing::{debug, error, info, warn};

use super::account::Account;
use super::clock::Clock;
use super::codec::{self, HashRecord, Pbkdf2Record};
use super::crypto::CryptoProvider;
use super::error::{AuthError, HashError};
use super::hasher::{self, Hasher, DEFAULT_ITERATIONS};
use super::master::MasterConfig;
use super::rate_limit::{FailureOutcome, LockStatus, RateLimitConfig, RateLimitState};
use super::repository::AccountRepository;
use super::session::DEFAULT_SESSION_TTL_MINUTES;
use super::state::{PersistedState, StateStore};

const MASTER_ROLE: &str = "admin";
const DEFAULT_ROLE: &str = "coach";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    rate_limit: RateLimitConfig,
    session_ttl_minutes: u64,
    iterations: u32,
    master: MasterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            iterations: DEFAULT_ITERATIONS,
            master: MasterConfig::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    #[must_use]
    pub fn with_session_ttl_minutes(mut self, minutes: u64) -> Self {
        self.session_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_master(mut self, master: MasterConfig) -> Self {
        self.master = master;
        self
    }
}

/// What a caller gets back from a valid verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub is_master: bool,
}

/// How the winning tier affects the stored record.
enum TierMatch {
    /// Canonical PBKDF2 matched; only metadata changes.
    Canonical,
    /// PBKDF2 matched but only the composite string existed; re-apply the
    /// canonical record (read-triggered normalization, not a migration).
    Normalize(Pbkdf2Record),
    /// A legacy tier matched; re-derive with the strongest available tier.
    Migrate,
}

pub struct AuthEngine {
    repository: Arc<dyn AccountRepository>,
    state_store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    hasher: Hasher,
    config: EngineConfig,
    state: Mutex<PersistedState>,
    busy: tokio::sync::Mutex<()>,
}

impl AuthEngine {
    #[must_use]
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        state_store: Arc<dyn StateStore>,
        crypto: Arc<dyn CryptoProvider>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let state = state_store.load();
        let hasher = Hasher::new(crypto).with_iterations(config.iterations);
        Self {
            repository,
            state_store,
            clock,
            hasher,
            config,
            state: Mutex::new(state),
            busy: tokio::sync::Mutex::new(()),
        }
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PersistedState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Flush failures must never block verification (read-only data dirs).
    fn flush_state(&self) {
        let snapshot = self.with_state(|state| state.clone());
        if let Err(err) = self.state_store.save(&snapshot) {
            warn!("failed to persist rate-limit/session state: {err}");
        }
    }

    /// Verify a username/password pair against the break-glass identities
    /// and the account collection.
    ///
    /// # Errors
    ///
    /// `MissingCredentials` before any lookup, `RateLimited` while a lockout
    /// is active (no hashing happens), `VerificationBusy` when another
    /// attempt is in flight, and `InvalidCredentials` for both unknown
    /// usernames and wrong passwords.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<VerificationResult, AuthError> {
        // At most one in-flight attempt; a concurrent caller is rejected
        // immediately rather than queued.
        let Ok(_busy) = self.busy.try_lock() else {
            return Err(AuthError::VerificationBusy);
        };

        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let now = self.now();
        let lock = self.with_state(|state| state.rate.check_lock(now));
        if lock.is_locked {
            return Err(AuthError::RateLimited {
                remaining_ms: lock.remaining_ms,
            });
        }

        // Break-glass identities resolve before any repository work.
        if self.config.master.matches(username, password) {
            info!(username, "break-glass credential accepted");
            self.clear_rate_limit();
            return Ok(VerificationResult {
                username: username.to_string(),
                full_name: username.to_string(),
                role: MASTER_ROLE.to_string(),
                is_master: true,
            });
        }

        let mut accounts = self.repository.all();
        let Some(index) = accounts
            .iter()
            .position(|account| account.username == username)
        else {
            self.note_failure();
            return Err(AuthError::InvalidCredentials);
        };

        let Some(matched) = self
            .check_tiers(&accounts[index], username, password)
            .await
        else {
            self.note_failure();
            return Err(AuthError::InvalidCredentials);
        };

        let account = &mut accounts[index];
        match matched {
            TierMatch::Canonical => {}
            TierMatch::Normalize(record) => {
                debug!(username, "normalizing composite-only credential record");
                codec::apply(account, &record);
            }
            TierMatch::Migrate => {
                let record = self.create_best_blocking(username, password).await;
                if !record.is_strong() {
                    warn!(
                        username,
                        tier = record.tier_name(),
                        "hash migration fell back to a legacy tier"
                    );
                }
                codec::apply_record(account, &record);
            }
        }
        account.last_login = now;
        if account.full_name.is_empty() {
            account.full_name = username.to_string();
        }
        let result = VerificationResult {
            username: account.username.clone(),
            full_name: account.full_name.clone(),
            role: account.role.clone(),
            is_master: false,
        };

        // One write covers migration, normalization and metadata. A failed
        // write is reported but the in-memory outcome stands.
        if let Err(err) = self.repository.save(&accounts) {
            error!("failed to persist account collection after verification: {err}");
        }
        self.clear_rate_limit();
        Ok(result)
    }

    /// Run the tiers strongest first. A `HashError` inside a tier means
    /// "this tier did not match" and falls through to the next weaker one.
    async fn check_tiers(
        &self,
        account: &Account,
        username: &str,
        password: &str,
    ) -> Option<TierMatch> {
        if let Some(record) = codec::extract(account) {
            match self
                .derive_strong_blocking(password.to_string(), record.clone())
                .await
            {
                Ok(derived) => {
                    let stored = hex::decode(&record.hash_hex).unwrap_or_default();
                    if hasher::bytes_match(&derived, &stored) {
                        return Some(if account.is_canonical() {
                            TierMatch::Canonical
                        } else {
                            TierMatch::Normalize(record)
                        });
                    }
                }
                Err(err) => debug!("strong tier unavailable, falling through: {err}"),
            }
        }

        match self.hasher.derive_legacy_keyed(password, username) {
            Ok(digest) => {
                // Historical data is inconsistent about which field held the
                // digest, so both are checked.
                if hasher::digests_match(&digest, &account.password.to_lowercase())
                    || hasher::digests_match(&digest, &account.hash.to_lowercase())
                {
                    return Some(TierMatch::Migrate);
                }
            }
            Err(err) => debug!("keyed tier unavailable, falling through: {err}"),
        }

        let blob = self.hasher.derive_legacy_weak(password);
        if hasher::digests_match(&blob, &account.password) {
            return Some(TierMatch::Migrate);
        }
        None
    }

    async fn derive_strong_blocking(
        &self,
        password: String,
        record: Pbkdf2Record,
    ) -> Result<Vec<u8>, HashError> {
        let salt = hex::decode(&record.salt_hex)
            .map_err(|_| HashError::InvalidParameters("salt is not valid hex".to_string()))?;
        let hasher = self.hasher.clone();
        task::spawn_blocking(move || hasher.derive_strong(&password, &salt, record.iterations))
            .await
            .map_err(|_| HashError::CryptoUnavailable)?
    }

    async fn create_best_blocking(&self, username: &str, password: &str) -> HashRecord {
        let hasher = self.hasher.clone();
        let (username, password) = (username.to_string(), password.to_string());
        match task::spawn_blocking(move || hasher.create_best(&username, &password)).await {
            Ok(record) => record,
            // Join failure is treated like an unavailable provider.
            Err(_) => HashRecord::LegacyWeak {
                blob: self.hasher.derive_legacy_weak(""),
            },
        }
    }

    /// Create a new account with a freshly derived strong hash.
    ///
    /// # Errors
    ///
    /// `MissingCredentials` for empty input, `DuplicateAccount` when the
    /// username is taken, `Persistence` when the collection write fails.
    pub async fn provision(
        &self,
        username: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<Account, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let mut accounts = self.repository.all();
        if accounts.iter().any(|account| account.username == username) {
            return Err(AuthError::DuplicateAccount);
        }

        let record = self.create_best_blocking(username, password).await;
        if !record.is_strong() {
            warn!(
                username,
                tier = record.tier_name(),
                "account provisioned with a degraded hash tier"
            );
        }

        let full_name = match full_name {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => username,
        };
        let mut account = Account::new(username, full_name);
        account.role = DEFAULT_ROLE.to_string();
        codec::apply_record(&mut account, &record);

        accounts.push(account.clone());
        self.repository.save(&accounts)?;
        Ok(account)
    }

    // --- rate-limit surface -------------------------------------------------

    pub fn record_failed_attempt(&self) -> FailureOutcome {
        let now = self.now();
        let outcome = self.with_state(|state| state.rate.record_failure(&self.config.rate_limit, now));
        self.flush_state();
        outcome
    }

    fn note_failure(&self) {
        let outcome = self.record_failed_attempt();
        if outcome.locked {
            warn!(
                lock_until_ms = outcome.lock_until_ms,
                "failed-attempt threshold reached, lockout engaged"
            );
        }
    }

    #[must_use]
    pub fn check_rate_limit(&self) -> LockStatus {
        let now = self.now();
        self.with_state(|state| state.rate.check_lock(now))
    }

    #[must_use]
    pub fn rate_limit_state(&self) -> RateLimitState {
        self.with_state(|state| state.rate)
    }

    pub fn clear_rate_limit(&self) {
        self.with_state(|state| state.rate.reset());
        self.flush_state();
    }

    // --- session surface ----------------------------------------------------

    /// Start a session; returns the absolute expiry timestamp.
    pub fn start_session(
        &self,
        username: &str,
        full_name: &str,
        role: &str,
        is_master: bool,
        ttl_minutes: Option<u64>,
    ) -> u64 {
        let now = self.now();
        let ttl = ttl_minutes.unwrap_or(self.config.session_ttl_minutes);
        let expires_at = self.with_state(|state| {
            state
                .session
                .start(username, full_name, role, is_master, now, ttl)
        });
        self.flush_state();
        expires_at
    }

    /// Lazy expiry: an expired session observed here is cleared together
    /// with the rate-limit counters.
    pub fn is_session_active(&self) -> bool {
        let now = self.now();
        let (active, expired) = self.with_state(|state| {
            let had_session = state.session.current().is_some();
            let active = state.session.is_active(now);
            if had_session && !active {
                state.rate.reset();
            }
            (active, had_session && !active)
        });
        if expired {
            self.flush_state();
        }
        active
    }

    /// Push the session expiry forward; no-op without an active session.
    pub fn extend_session(&self, ttl_minutes: Option<u64>) -> Option<u64> {
        let now = self.now();
        let ttl = ttl_minutes.unwrap_or(self.config.session_ttl_minutes);
        let extended = self.with_state(|state| state.session.extend(now, ttl));
        if extended.is_some() {
            self.flush_state();
        }
        extended
    }

    pub fn end_session(&self) {
        self.with_state(|state| {
            state.session.end();
            state.rate.reset();
        });
        self.flush_state();
    }
}
