//! Break-glass identities resolved by static configuration.
//!
//! Two privileged credentials bypass the account repository entirely: the
//! primary admin (username case-sensitive) and one legacy operator
//! (username case-insensitive). Passwords are compared exactly, never
//! hashed, and always constant-time.

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

#[derive(Debug, Clone)]
struct MasterCredential {
    username: String,
    password: SecretString,
}

#[derive(Debug, Clone, Default)]
pub struct MasterConfig {
    admin: Option<MasterCredential>,
    operator: Option<MasterCredential>,
}

impl MasterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_admin(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.admin = Some(MasterCredential {
            username: username.into(),
            password,
        });
        self
    }

    #[must_use]
    pub fn with_operator(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.operator = Some(MasterCredential {
            username: username.into(),
            password,
        });
        self
    }

    /// Match against both break-glass identities. Resolved before any
    /// repository lookup happens.
    #[must_use]
    pub fn matches(&self, username: &str, password: &str) -> bool {
        if let Some(admin) = &self.admin {
            if admin.username == username && secret_matches(&admin.password, password) {
                return true;
            }
        }
        if let Some(operator) = &self.operator {
            if operator.username.eq_ignore_ascii_case(username)
                && secret_matches(&operator.password, password)
            {
                return true;
            }
        }
        false
    }
}

fn secret_matches(expected: &SecretString, supplied: &str) -> bool {
    let expected = expected.expose_secret().as_bytes();
    let supplied = supplied.as_bytes();
    expected.len() == supplied.len() && bool::from(expected.ct_eq(supplied))
}
