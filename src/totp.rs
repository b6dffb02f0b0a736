//! Time-based one-time passwords (RFC 6238, HMAC-SHA1).

use std::time::{SystemTime, UNIX_EPOCH};

use base32::Alphabet;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha1::Sha1;

pub const DEFAULT_DIGITS: u32 = 6;
pub const DEFAULT_PERIOD: u64 = 30;

// RFC 4226 recommended secret size.
const SECRET_LENGTH: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TotpError {
    #[error("invalid base32 encoding")]
    Base32,
    #[error("system time error")]
    Time,
}

/// Generates a new shared secret, base32-encoded without padding.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LENGTH];
    OsRng.fill_bytes(&mut bytes);

    base32::encode(Alphabet::Rfc4648 { padding: false }, &bytes)
}

/// Generates the TOTP code for an arbitrary timestamp.
pub fn code_at(
    secret: &str,
    unix_time: u64,
    period: u64,
    digits: u32,
) -> Result<String, TotpError> {
    let key = base32::decode(Alphabet::Rfc4648 { padding: false }, secret)
        .ok_or(TotpError::Base32)?;

    let counter = (unix_time / period).to_be_bytes();
    let mut mac =
        Hmac::<Sha1>::new_from_slice(&key).map_err(|_| TotpError::Base32)?;
    mac.update(&counter);
    let result = mac.finalize().into_bytes();

    let offset = (result[19] & 0x0f) as usize;
    let binary_code = ((result[offset] as u32 & 0x7f) << 24)
        | ((result[offset + 1] as u32) << 16)
        | ((result[offset + 2] as u32) << 8)
        | (result[offset + 3] as u32);

    let mut code = (binary_code % 10u32.pow(digits)).to_string();

    // Ensure the code has the correct number of digits.
    while code.len() < digits as usize {
        code.insert(0, '0');
    }

    Ok(code)
}

/// Generates the TOTP code for the current time step.
pub fn current_code(
    secret: &str,
    period: u64,
    digits: u32,
) -> Result<String, TotpError> {
    code_at(secret, now()?, period, digits)
}

/// Check a submitted code against the current time step.
///
/// Only the exact current step is accepted, no clock-skew window. A missing,
/// empty or undecodable secret always fails closed.
pub fn verify(
    secret: Option<&str>,
    submitted: &str,
    period: u64,
    digits: u32,
) -> bool {
    match secret {
        Some(secret) if !secret.is_empty() => {
            current_code(secret, period, digits)
                .map(|expected| expected == submitted)
                .unwrap_or(false)
        },
        _ => false,
    }
}

/// Format a standard `otpauth://totp/` provisioning URI for authenticator
/// applications.
pub fn provisioning_uri(
    label: &str,
    secret: &str,
    issuer: &str,
) -> Result<String, url::ParseError> {
    let mut uri = url::Url::parse("otpauth://totp/")?;
    uri.set_path(&format!("/{issuer}:{label}"));
    uri.query_pairs_mut()
        .append_pair("secret", secret)
        .append_pair("issuer", issuer);

    Ok(uri.to_string())
}

fn now() -> Result<u64, TotpError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|_| TotpError::Time)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ASCII "12345678901234567890", the RFC 6238 test key.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_rfc6238_vectors() {
        // Low-order digits of the published SHA-1 vectors.
        assert_eq!(code_at(RFC_SECRET, 59, 30, 6).unwrap(), "287082");
        assert_eq!(code_at(RFC_SECRET, 1111111109, 30, 6).unwrap(), "081804");
        assert_eq!(code_at(RFC_SECRET, 1234567890, 30, 6).unwrap(), "005924");
    }

    #[test]
    fn test_code_rotates() {
        let t = 1111111109;
        let code = code_at(RFC_SECRET, t, 30, 6).unwrap();

        assert_eq!(code_at(RFC_SECRET, t, 30, 6).unwrap(), code);
        assert_ne!(code_at(RFC_SECRET, t + 300, 30, 6).unwrap(), code);
    }

    #[test]
    fn test_verify_current_step() {
        let code = current_code(RFC_SECRET, 30, 6).unwrap();

        assert!(verify(Some(RFC_SECRET), &code, 30, 6));
        assert!(!verify(Some(RFC_SECRET), "000000", 30, 6) || code == "000000");
    }

    #[test]
    fn test_verify_fails_closed() {
        assert!(!verify(None, "123456", 30, 6));
        assert!(!verify(Some(""), "123456", 30, 6));
        // '1' and '8' are outside the base32 alphabet.
        assert!(!verify(Some("18!!"), "123456", 30, 6));
    }

    #[test]
    fn test_generated_secret_shape() {
        let secret = generate_secret();

        // 20 bytes encode to 32 base32 characters.
        assert_eq!(secret.len(), 32);
        assert!(
            base32::decode(Alphabet::Rfc4648 { padding: false }, &secret)
                .is_some()
        );
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn test_provisioning_uri() {
        let uri =
            provisioning_uri("alice@example.com", RFC_SECRET, "Itinera")
                .unwrap();

        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("Itinera"));
        assert!(uri.contains(&format!("secret={RFC_SECRET}")));
        assert!(uri.contains("issuer=Itinera"));
    }
}
