//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::user::Role;

pub const DEFAULT_TTL_MINUTES: u64 = 240;

/// Pieces of information asserted on a session token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the token must not
    /// be accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the token was issued.
    pub iat: u64,
    /// Identifies the instance that issued the token.
    pub iss: String,
    /// Account email. The only subject identifier ever used.
    pub sub: String,
    /// Account privilege level at issuance time.
    pub role: Role,
}

/// Issue and validate signed session tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_seconds: u64,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(
        issuer: &str,
        secret: impl AsRef<[u8]>,
        ttl_minutes: u64,
    ) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            issuer: issuer.to_owned(),
            ttl_seconds: ttl_minutes * 60,
        }
    }

    /// Number of seconds a freshly issued token stays valid.
    pub fn expires_in(&self) -> u64 {
        self.ttl_seconds
    }

    /// Create a new session token for an account.
    pub fn create(&self, email: &str, role: Role) -> Result<String> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ServerError::Internal {
                details: "system clock before unix epoch".into(),
                source: Some(Box::new(err)),
            })?
            .as_secs();

        let header = Header::new(self.algorithm);
        let claims = Claims {
            exp: time + self.ttl_seconds,
            iat: time,
            iss: self.issuer.clone(),
            sub: email.to_owned(),
            role,
        };

        encode(&header, &claims, &self.encoding_key).map_err(|err| {
            ServerError::Internal {
                details: "cannot sign session token".into(),
                source: Some(Box::new(err)),
            }
        })
    }

    /// Decode and check a token.
    ///
    /// Tampering, expiry and issuer mismatch all collapse to the same
    /// authentication failure.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "https://itinera.example.com/";
    const SECRET: &str = "an-unguessable-test-secret";

    fn manager() -> TokenManager {
        TokenManager::new(ISSUER, SECRET, DEFAULT_TTL_MINUTES)
    }

    #[test]
    fn test_roundtrip() {
        let manager = manager();
        let token = manager.create("alice@example.com", Role::User).unwrap();
        let claims = manager.decode(&token).unwrap();

        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp, claims.iat + DEFAULT_TTL_MINUTES * 60);
    }

    #[test]
    fn test_tampered_signature() {
        let manager = manager();
        let token = manager.create("alice@example.com", Role::User).unwrap();

        let mut forged = token.clone();
        let last = forged.pop().unwrap();
        forged.push(if last == 'A' { 'B' } else { 'A' });

        assert!(manager.decode(&forged).is_err());
    }

    #[test]
    fn test_tampered_payload() {
        let manager = manager();
        let admin = manager.create("alice@example.com", Role::Admin).unwrap();
        let user = manager.create("alice@example.com", Role::User).unwrap();

        // Payload from one token, signature from another.
        let parts: Vec<&str> = admin.split('.').collect();
        let signature = user.split('.').next_back().unwrap();
        let forged = format!("{}.{}.{}", parts[0], parts[1], signature);

        assert!(manager.decode(&forged).is_err());
    }

    #[test]
    fn test_expired() {
        let manager = manager();
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Expired well past the default decode leeway.
        let claims = Claims {
            exp: time - 3600,
            iat: time - 7200,
            iss: ISSUER.to_owned(),
            sub: "alice@example.com".to_owned(),
            role: Role::User,
        };
        let token = encode(
            &Header::new(manager.algorithm),
            &claims,
            &manager.encoding_key,
        )
        .unwrap();

        assert!(manager.decode(&token).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let manager = manager();
        let other = TokenManager::new(ISSUER, "another-secret", 240);
        let token = manager.create("alice@example.com", Role::User).unwrap();

        assert!(other.decode(&token).is_err());
        assert!(manager.decode(&token).is_ok());
    }

    #[test]
    fn test_wrong_issuer() {
        let manager = manager();
        let other =
            TokenManager::new("https://elsewhere.example.com/", SECRET, 240);
        let token = other.create("alice@example.com", Role::User).unwrap();

        assert!(manager.decode(&token).is_err());
    }
}
