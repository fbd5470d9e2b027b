//! # Caseguard
//!
//! Credential verification and account-hardening engine for the local
//! case-management tool. The login screen, onboarding flows and the rest
//! of the UI are external callers; this crate owns the contracts they rely
//! on:
//!
//! - **Hash storage and migration:** accounts carry one of three historical
//!   credential formats. Verification prefers PBKDF2-HMAC-SHA256 and
//!   silently upgrades weaker records on the next successful login.
//! - **Abuse mitigation:** a failed-attempt counter with a cooldown
//!   lockout, enforced before any hashing work happens.
//! - **Sessions:** a time-boxed login state with lazy expiry.
//!
//! Persistence is deliberately simple: the whole account collection is one
//! JSON document replaced atomically per mutation, plus a small KV file for
//! the limiter and session fields. Unreadable state degrades to empty
//! instead of failing the login path.

pub mod auth;
pub mod cli;
