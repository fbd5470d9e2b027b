//! Error taxonomy for the verification engine.
//!
//! Account-not-found and wrong-password share a single variant on purpose:
//! callers must not be able to tell which one happened.

use thiserror::Error;

/// Failures inside the hashing tiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The host's cryptographic primitives are inaccessible. This is a real
    /// failure mode on sandboxed or legacy hosts, recovered by falling back
    /// to a weaker tier.
    #[error("cryptographic provider unavailable")]
    CryptoUnavailable,

    #[error("invalid hash parameters: {0}")]
    InvalidParameters(String),
}

/// Persistence failures from the account collection or the KV state file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize persisted state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the engine surface can return to a caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,

    /// Covers both "no such account" and "wrong password".
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("too many failed attempts, retry in {remaining_ms}ms")]
    RateLimited { remaining_ms: u64 },

    /// A second verification was requested while one is still in flight.
    #[error("another verification attempt is in progress")]
    VerificationBusy,

    #[error("an account with that username already exists")]
    DuplicateAccount,

    #[error(transparent)]
    Crypto(#[from] HashError),

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_message_is_enumeration_safe() {
        // The display text must not distinguish unknown users from bad passwords.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid username or password"
        );
    }

    #[test]
    fn hash_error_converts_into_auth_error() {
        let err: AuthError = HashError::CryptoUnavailable.into();
        assert!(matches!(
            err,
            AuthError::Crypto(HashError::CryptoUnavailable)
        ));
    }
}
