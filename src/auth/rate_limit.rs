//! Failed-attempt counter with cooldown lockout.
//!
//! Pure counter logic over an injected timestamp; one global instance per
//! profile (the tool assumes a single local user), not per-account limiting.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCKOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    max_attempts: u32,
    lockout_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_ms: DEFAULT_LOCKOUT_MS,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_lockout_ms(mut self, lockout_ms: u64) -> Self {
        self.lockout_ms = lockout_ms;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout_ms(&self) -> u64 {
        self.lockout_ms
    }
}

/// Failures since the last reset plus the absolute lockout deadline
/// (0 = not locked). Persisted in the KV state file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitState {
    pub attempts: u32,
    pub lock_until_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub locked: bool,
    pub remaining_attempts: u32,
    pub lock_until_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    pub is_locked: bool,
    pub remaining_ms: u64,
}

impl RateLimitState {
    /// Count one failure; trips the lockout at the attempt threshold.
    /// Attempts reset to zero when the lock is triggered.
    pub fn record_failure(&mut self, config: &RateLimitConfig, now_ms: u64) -> FailureOutcome {
        self.attempts += 1;
        if self.attempts >= config.max_attempts() {
            self.lock_until_ms = now_ms.saturating_add(config.lockout_ms());
            self.attempts = 0;
            FailureOutcome {
                locked: true,
                remaining_attempts: 0,
                lock_until_ms: self.lock_until_ms,
            }
        } else {
            FailureOutcome {
                locked: false,
                remaining_attempts: config.max_attempts() - self.attempts,
                lock_until_ms: 0,
            }
        }
    }

    #[must_use]
    pub fn check_lock(&self, now_ms: u64) -> LockStatus {
        if self.lock_until_ms > now_ms {
            LockStatus {
                is_locked: true,
                remaining_ms: self.lock_until_ms - now_ms,
            }
        } else {
            LockStatus {
                is_locked: false,
                remaining_ms: 0,
            }
        }
    }

    /// Clear both fields; called on any successful verification.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
