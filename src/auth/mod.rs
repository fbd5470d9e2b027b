//! Credential verification and account hardening.
//!
//! The engine verifies a username/password pair against three historical
//! hash formats (PBKDF2, keyed SHA-256, reversible base64), migrates
//! outdated records to PBKDF2 on successful login, enforces a
//! failed-attempt lockout, and manages a time-boxed session.

pub mod account;
pub mod clock;
pub mod codec;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod master;
pub mod rate_limit;
pub mod repository;
pub mod session;
pub mod state;

pub use account::{Account, HashMethod};
pub use engine::{AuthEngine, EngineConfig, VerificationResult};
pub use error::{AuthError, HashError, StoreError};
pub use master::MasterConfig;
