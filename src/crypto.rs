//! Password hashing.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self, CryptoError> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2 {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id with a random salt.
    pub fn hash_password(
        &self,
        password: impl AsRef<[u8]>,
    ) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    ///
    /// Malformed or foreign digests verify to `false`, never to an error.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> bool {
        let Ok(parsed) = PasswordHash::new(phc_hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PasswordManager {
        // Cheap parameters, hashing cost is not under test.
        PasswordManager::new(Some(ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap()
    }

    #[test]
    fn test_hash_roundtrip() {
        let pwd = manager();
        let digest = pwd.hash_password("P$soW%920$n&").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(pwd.verify_password("P$soW%920$n&", &digest));
        assert!(!pwd.verify_password("p$soW%920$n&", &digest));
    }

    #[test]
    fn test_salt_is_random() {
        let pwd = manager();
        let first = pwd.hash_password("same_password").unwrap();
        let second = pwd.hash_password("same_password").unwrap();

        assert_ne!(first, second);
        assert!(pwd.verify_password("same_password", &first));
        assert!(pwd.verify_password("same_password", &second));
    }

    #[test]
    fn test_malformed_digest() {
        let pwd = manager();

        assert!(!pwd.verify_password("password", ""));
        assert!(!pwd.verify_password("password", "not-a-phc-string"));
        assert!(!pwd.verify_password("password", "$2b$12$abcdefghijk"));
    }
}
