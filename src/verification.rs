//! Short-lived signed tokens binding an email address.
//!
//! Used for the email-verification link and for second-factor enrollment
//! right after verification. Tokens are stateless: decoding checks the
//! signature and the age, it does not consume anything.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Token classes. Each purpose signs with its own derived key so a token of
/// one class can never be replayed as another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purpose {
    EmailVerify,
    OtpSetup,
}

impl Purpose {
    fn salt(self) -> &'static [u8] {
        match self {
            Self::EmailVerify => b"itinera.email-verify",
            Self::OtpSetup => b"itinera.otp-setup",
        }
    }
}

/// Tampered, expired and malformed tokens are indistinguishable on purpose.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("token is invalid or expired")]
pub struct InvalidToken;

/// Sign and verify purpose-salted verification tokens.
#[derive(Clone)]
pub struct VerificationCodec {
    key: Zeroizing<Vec<u8>>,
}

impl VerificationCodec {
    /// Create a codec for one purpose, deriving its key from the server
    /// secret and the purpose salt.
    pub fn new(secret: impl AsRef<[u8]>, purpose: Purpose) -> Self {
        let mut mac = HmacSha256::new_from_slice(secret.as_ref())
            .expect("hmac accepts keys of any length");
        mac.update(purpose.salt());

        Self {
            key: Zeroizing::new(mac.finalize().into_bytes().to_vec()),
        }
    }

    /// Produce a URL-safe token binding `email` and the current time.
    pub fn issue(&self, email: &str) -> String {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or_default();

        self.issue_at(email, issued_at)
    }

    fn issue_at(&self, email: &str, issued_at: u64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(email.as_bytes());
        let timestamp = URL_SAFE_NO_PAD.encode(issued_at.to_be_bytes());
        let signature = URL_SAFE_NO_PAD
            .encode(self.signature(&payload, &timestamp).finalize().into_bytes());

        format!("{payload}.{timestamp}.{signature}")
    }

    /// Verify signature and age, returning the embedded email address.
    pub fn decode(
        &self,
        token: &str,
        max_age_secs: u64,
    ) -> Result<String, InvalidToken> {
        let mut parts = token.splitn(3, '.');
        let (Some(payload), Some(timestamp), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(InvalidToken);
        };

        let tag = URL_SAFE_NO_PAD.decode(signature).map_err(|_| InvalidToken)?;
        self.signature(payload, timestamp)
            .verify_slice(&tag)
            .map_err(|_| InvalidToken)?;

        let issued_at: [u8; 8] = URL_SAFE_NO_PAD
            .decode(timestamp)
            .map_err(|_| InvalidToken)?
            .try_into()
            .map_err(|_| InvalidToken)?;
        let issued_at = u64::from_be_bytes(issued_at);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or_default();
        // Tokens from the future are as invalid as expired ones.
        if issued_at > now || now - issued_at > max_age_secs {
            return Err(InvalidToken);
        }

        let email =
            URL_SAFE_NO_PAD.decode(payload).map_err(|_| InvalidToken)?;
        String::from_utf8(email).map_err(|_| InvalidToken)
    }

    fn signature(&self, payload: &str, timestamp: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("hmac accepts keys of any length");
        mac.update(payload.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-unguessable-test-secret";
    const EMAIL: &str = "alice@example.com";

    #[test]
    fn test_roundtrip() {
        let codec = VerificationCodec::new(SECRET, Purpose::EmailVerify);
        let token = codec.issue(EMAIL);

        assert_eq!(
            codec.decode(&token, DEFAULT_MAX_AGE_SECS).as_deref(),
            Ok(EMAIL)
        );
    }

    #[test]
    fn test_url_safe() {
        let codec = VerificationCodec::new(SECRET, Purpose::EmailVerify);
        let token = codec.issue("user+tag@example.com");

        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
        );
    }

    #[test]
    fn test_tampered() {
        let codec = VerificationCodec::new(SECRET, Purpose::EmailVerify);
        let token = codec.issue(EMAIL);

        let mut forged = token.clone();
        let last = forged.pop().unwrap();
        forged.push(if last == 'A' { 'B' } else { 'A' });
        assert!(codec.decode(&forged, DEFAULT_MAX_AGE_SECS).is_err());

        // Payload swap without re-signing.
        let signature = token.rsplit('.').next().unwrap();
        let other = codec.issue("mallory@example.com");
        let mut parts = other.splitn(3, '.');
        let forged = format!(
            "{}.{}.{signature}",
            parts.next().unwrap(),
            parts.next().unwrap()
        );
        assert!(codec.decode(&forged, DEFAULT_MAX_AGE_SECS).is_err());
    }

    #[test]
    fn test_expired() {
        let codec = VerificationCodec::new(SECRET, Purpose::EmailVerify);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let token = codec.issue_at(EMAIL, now - 10);
        assert_eq!(
            codec.decode(&token, DEFAULT_MAX_AGE_SECS).as_deref(),
            Ok(EMAIL)
        );
        assert!(codec.decode(&token, 5).is_err());

        // Issued-at in the future fails too.
        let token = codec.issue_at(EMAIL, now + 600);
        assert!(codec.decode(&token, DEFAULT_MAX_AGE_SECS).is_err());
    }

    #[test]
    fn test_cross_purpose() {
        let verify = VerificationCodec::new(SECRET, Purpose::EmailVerify);
        let setup = VerificationCodec::new(SECRET, Purpose::OtpSetup);

        let token = verify.issue(EMAIL);
        assert!(setup.decode(&token, DEFAULT_MAX_AGE_SECS).is_err());
        assert!(verify.decode(&token, DEFAULT_MAX_AGE_SECS).is_ok());
    }

    #[test]
    fn test_malformed() {
        let codec = VerificationCodec::new(SECRET, Purpose::EmailVerify);

        assert!(codec.decode("", DEFAULT_MAX_AGE_SECS).is_err());
        assert!(codec.decode("a.b", DEFAULT_MAX_AGE_SECS).is_err());
        assert!(codec.decode("a.b.c", DEFAULT_MAX_AGE_SECS).is_err());
        assert!(
            codec
                .decode("%%%.###.!!!", DEFAULT_MAX_AGE_SECS)
                .is_err()
        );
    }
}
