//! Time-boxed login state with lazy expiry.
//!
//! Expiry is evaluated on each check, never via a background timer. The
//! engine couples an observed expiry with a rate-limit reset.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_TTL_MINUTES: u64 = 120;

const MS_PER_MINUTE: u64 = 60_000;

/// Ephemeral proof of authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub is_master: bool,
    pub expires_at_ms: u64,
}

/// The single login slot. `None` doubles as the "logged in" flag being off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    session: Option<Session>,
}

impl SessionState {
    /// Start a session; returns the absolute expiry timestamp.
    pub fn start(
        &mut self,
        username: &str,
        full_name: &str,
        role: &str,
        is_master: bool,
        now_ms: u64,
        ttl_minutes: u64,
    ) -> u64 {
        let expires_at_ms = now_ms.saturating_add(ttl_minutes.saturating_mul(MS_PER_MINUTE));
        self.session = Some(Session {
            username: username.to_string(),
            full_name: full_name.to_string(),
            role: role.to_string(),
            is_master,
            expires_at_ms,
        });
        expires_at_ms
    }

    /// Valid iff a session is present and `now < expires_at`. An expired
    /// session is cleared as a side effect of the check.
    pub fn is_active(&mut self, now_ms: u64) -> bool {
        match &self.session {
            Some(session) if now_ms < session.expires_at_ms => true,
            Some(_) => {
                self.session = None;
                false
            }
            None => false,
        }
    }

    /// Push the expiry forward ("activity keeps you logged in"). No-op when
    /// no session is active; returns the new expiry otherwise.
    pub fn extend(&mut self, now_ms: u64, ttl_minutes: u64) -> Option<u64> {
        if !self.is_active(now_ms) {
            return None;
        }
        let expires_at_ms = now_ms.saturating_add(ttl_minutes.saturating_mul(MS_PER_MINUTE));
        if let Some(session) = &mut self.session {
            session.expires_at_ms = expires_at_ms;
        }
        Some(expires_at_ms)
    }

    pub fn end(&mut self) {
        self.session = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(now_ms: u64, ttl_minutes: u64) -> SessionState {
        let mut state = SessionState::default();
        state.start("alice", "Alice", "coach", false, now_ms, ttl_minutes);
        state
    }

    #[test]
    fn active_within_ttl() {
        let mut state = started(0, 120);
        assert!(state.is_active(0));
        assert!(state.is_active(120 * MS_PER_MINUTE - 1));
    }

    #[test]
    fn zero_ttl_expires_on_next_check() {
        let mut state = started(5_000, 0);
        assert!(!state.is_active(5_000));
        assert!(state.current().is_none());
    }

    #[test]
    fn expiry_clears_session_lazily() {
        let mut state = started(0, 1);
        assert!(state.current().is_some());
        assert!(!state.is_active(MS_PER_MINUTE));
        assert!(state.current().is_none());
    }

    #[test]
    fn extend_pushes_expiry_forward() {
        let mut state = started(0, 1);
        let extended = state.extend(30_000, 2);
        assert_eq!(extended, Some(30_000 + 2 * MS_PER_MINUTE));
        assert!(state.is_active(MS_PER_MINUTE + 1));
    }

    #[test]
    fn extend_is_noop_without_active_session() {
        let mut state = SessionState::default();
        assert_eq!(state.extend(0, 120), None);

        let mut expired = started(0, 1);
        assert_eq!(expired.extend(MS_PER_MINUTE, 120), None);
        assert!(expired.current().is_none());
    }

    #[test]
    fn end_clears_state() {
        let mut state = started(0, 120);
        state.end();
        assert!(!state.is_active(0));
    }
}
