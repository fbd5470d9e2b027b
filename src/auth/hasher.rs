//! The three credential hash tiers, strongest preferred.
//!
//! New accounts always get PBKDF2. The keyed SHA-256 tier and the reversible
//! base64 tier exist only so accounts created years ago still verify; both
//! are migrated to PBKDF2 on their next successful login. Comparisons of any
//! secret-derived material are constant-time regardless of tier.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::codec::{HashRecord, Pbkdf2Record};
use super::crypto::CryptoProvider;
use super::error::HashError;

pub const DEFAULT_ITERATIONS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 32;

// Embedded pepper for the historical keyed tier. Interop constant: changing
// it locks out every sha256-legacy account.
const LEGACY_KEYED_SECRET: &str = "cg-legacy-pepper";
// Fixed salt string of the oldest (reversible) tier.
const LEGACY_WEAK_SALT: &str = "cg-weak-salt";

#[derive(Clone)]
pub struct Hasher {
    crypto: Arc<dyn CryptoProvider>,
    iterations: u32,
}

impl Hasher {
    #[must_use]
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            crypto,
            iterations: DEFAULT_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Key-stretching derivation with caller-supplied salt and work factor.
    pub fn derive_strong(
        &self,
        password: &str,
        salt: &[u8],
        iterations: u32,
    ) -> Result<Vec<u8>, HashError> {
        let mut out = vec![0u8; HASH_LEN];
        self.crypto
            .pbkdf2_sha256(password.as_bytes(), salt, iterations, &mut out)?;
        Ok(out)
    }

    /// Derive a fresh canonical record with a random salt.
    pub fn derive_strong_record(&self, password: &str) -> Result<Pbkdf2Record, HashError> {
        let mut salt = [0u8; SALT_LEN];
        self.crypto.fill_random(&mut salt)?;
        let hash = self.derive_strong(password, &salt, self.iterations)?;
        Ok(Pbkdf2Record {
            iterations: self.iterations,
            salt_hex: hex::encode(salt),
            hash_hex: hex::encode(hash),
        })
    }

    /// Historical keyed tier: hex SHA-256 over
    /// `password || lowercase(username) || <embedded secret>`.
    /// Verification only; never chosen for new accounts.
    pub fn derive_legacy_keyed(
        &self,
        password: &str,
        username: &str,
    ) -> Result<String, HashError> {
        let material = format!(
            "{password}{}{LEGACY_KEYED_SECRET}",
            username.to_lowercase()
        );
        let digest = self.crypto.sha256(material.as_bytes())?;
        Ok(hex::encode(digest))
    }

    /// Oldest tier: reversible base64 encoding, not a hash. Kept purely so
    /// ancient accounts are not locked out.
    #[must_use]
    pub fn derive_legacy_weak(&self, password: &str) -> String {
        STANDARD.encode(format!("{password}{LEGACY_WEAK_SALT}"))
    }

    /// Derive the strongest record the host can produce, falling back one
    /// tier at a time. The returned variant tells the caller which tier was
    /// used so degraded-security events can be logged.
    #[must_use]
    pub fn create_best(&self, username: &str, password: &str) -> HashRecord {
        match self.derive_strong_record(password) {
            Ok(record) => HashRecord::Pbkdf2(record),
            Err(err) => {
                debug!("strong derivation unavailable, falling back: {err}");
                match self.derive_legacy_keyed(password, username) {
                    Ok(digest_hex) => HashRecord::LegacyKeyed { digest_hex },
                    Err(err) => {
                        debug!("keyed derivation unavailable, falling back: {err}");
                        HashRecord::LegacyWeak {
                            blob: self.derive_legacy_weak(password),
                        }
                    }
                }
            }
        }
    }
}

/// Constant-time equality over raw digest bytes.
///
/// Equal-length XOR accumulation with no early exit; a length mismatch is an
/// immediate false because digest lengths are not secret.
#[must_use]
pub fn bytes_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Constant-time equality over encoded digest strings.
#[must_use]
pub fn digests_match(a: &str, b: &str) -> bool {
    bytes_match(a.as_bytes(), b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use std::sync::Arc;

    use crate::auth::crypto::OsCrypto;

    /// Provider whose strong primitives are switched off, mimicking a
    /// sandboxed host.
    struct NoStrongCrypto {
        sha_available: bool,
    }

    impl CryptoProvider for NoStrongCrypto {
        fn fill_random(&self, _buf: &mut [u8]) -> Result<(), HashError> {
            Err(HashError::CryptoUnavailable)
        }

        fn pbkdf2_sha256(
            &self,
            _password: &[u8],
            _salt: &[u8],
            _iterations: u32,
            _out: &mut [u8],
        ) -> Result<(), HashError> {
            Err(HashError::CryptoUnavailable)
        }

        fn sha256(&self, data: &[u8]) -> Result<[u8; 32], HashError> {
            if self.sha_available {
                OsCrypto.sha256(data)
            } else {
                Err(HashError::CryptoUnavailable)
            }
        }
    }

    fn hasher() -> Hasher {
        // Small work factor keeps the suite fast.
        Hasher::new(Arc::new(OsCrypto)).with_iterations(1_000)
    }

    #[test]
    fn strong_record_verifies_and_salts_differ() {
        let hasher = hasher();
        let first = hasher.derive_strong_record("secret").expect("derivation");
        let second = hasher.derive_strong_record("secret").expect("derivation");
        assert_ne!(first.salt_hex, second.salt_hex);

        let salt = hex::decode(&first.salt_hex).expect("valid hex");
        let derived = hasher
            .derive_strong("secret", &salt, first.iterations)
            .expect("derivation");
        assert_eq!(hex::encode(derived), first.hash_hex);
    }

    #[test]
    fn legacy_keyed_lowercases_username() {
        let hasher = hasher();
        let lower = hasher.derive_legacy_keyed("pw", "alice").expect("digest");
        let upper = hasher.derive_legacy_keyed("pw", "ALICE").expect("digest");
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 64);
    }

    #[test]
    fn legacy_weak_is_deterministic() {
        let hasher = hasher();
        assert_eq!(
            hasher.derive_legacy_weak("pw"),
            hasher.derive_legacy_weak("pw")
        );
        assert_ne!(
            hasher.derive_legacy_weak("pw"),
            hasher.derive_legacy_weak("pw2")
        );
    }

    #[test]
    fn create_best_prefers_strong() {
        let record = hasher().create_best("alice", "pw");
        assert!(record.is_strong());
    }

    #[test]
    fn create_best_falls_back_to_keyed_then_weak() {
        let keyed_only = Hasher::new(Arc::new(NoStrongCrypto {
            sha_available: true,
        }));
        assert_eq!(
            keyed_only.create_best("alice", "pw").tier_name(),
            "sha256-legacy"
        );

        let weak_only = Hasher::new(Arc::new(NoStrongCrypto {
            sha_available: false,
        }));
        assert_eq!(
            weak_only.create_best("alice", "pw").tier_name(),
            "base64-legacy"
        );
    }

    #[test]
    fn bytes_match_basics() {
        assert!(bytes_match(b"abc", b"abc"));
        assert!(!bytes_match(b"abc", b"abd"));
        assert!(!bytes_match(b"abc", b"ab"));
        assert!(bytes_match(b"", b""));
    }

    #[quickcheck]
    fn constant_time_compare_agrees_with_equality(a: Vec<u8>, b: Vec<u8>) -> bool {
        bytes_match(&a, &b) == (a == b)
    }

    #[quickcheck]
    fn constant_time_compare_detects_single_flips(bytes: Vec<u8>, index: usize) -> bool {
        if bytes.is_empty() {
            return true;
        }
        let mut flipped = bytes.clone();
        let index = index % bytes.len();
        flipped[index] ^= 0x01;
        !bytes_match(&bytes, &flipped)
    }
}
