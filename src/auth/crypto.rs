//! Crypto provider seam.
//!
//! The engine never calls a primitive directly: everything goes through
//! `CryptoProvider` so hosts with broken or sandboxed crypto surface as
//! `CryptoUnavailable` (which the verification tiers recover from) and so
//! tests can force that path deterministically.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::error::HashError;

pub trait CryptoProvider: Send + Sync {
    /// Fill `buf` from a cryptographic PRNG.
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), HashError>;

    /// PBKDF2-HMAC-SHA256 into `out`.
    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> Result<(), HashError>;

    /// Single-pass SHA-256.
    fn sha256(&self, data: &[u8]) -> Result<[u8; 32], HashError>;
}

/// Production provider backed by the OS entropy source and the `pbkdf2`
/// and `sha2` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsCrypto;

impl CryptoProvider for OsCrypto {
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), HashError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|_| HashError::CryptoUnavailable)
    }

    fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> Result<(), HashError> {
        if iterations == 0 {
            return Err(HashError::InvalidParameters(
                "iterations must be non-zero".to_string(),
            ));
        }
        if salt.is_empty() {
            return Err(HashError::InvalidParameters(
                "salt must be non-empty".to_string(),
            ));
        }
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
        Ok(())
    }

    fn sha256(&self, data: &[u8]) -> Result<[u8; 32], HashError> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Ok(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_random_produces_distinct_salts() {
        let crypto = OsCrypto;
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        crypto.fill_random(&mut first).expect("entropy available");
        crypto.fill_random(&mut second).expect("entropy available");
        assert_ne!(first, second);
    }

    #[test]
    fn pbkdf2_rejects_zero_iterations_and_empty_salt() {
        let crypto = OsCrypto;
        let mut out = [0u8; 32];
        assert!(crypto.pbkdf2_sha256(b"pw", b"salt", 0, &mut out).is_err());
        assert!(crypto.pbkdf2_sha256(b"pw", b"", 1000, &mut out).is_err());
    }

    #[test]
    fn pbkdf2_matches_rfc_test_vector() {
        // RFC 6070-style vector for PBKDF2-HMAC-SHA256:
        // P="password", S="salt", c=1, dkLen=32.
        let crypto = OsCrypto;
        let mut out = [0u8; 32];
        crypto
            .pbkdf2_sha256(b"password", b"salt", 1, &mut out)
            .expect("derivation succeeds");
        assert_eq!(
            hex::encode(out),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn sha256_known_vector() {
        let crypto = OsCrypto;
        let digest = crypto.sha256(b"abc").expect("digest succeeds");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
