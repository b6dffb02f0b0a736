//! HTTP routes.

pub mod auth;
pub mod friends;
pub mod status;
pub mod trips;

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::ServerError;

/// Plain confirmation payload.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// JSON body extractor running `validator` checks before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

static USERNAME: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$")
        .expect("username pattern")
});

/// Usernames are display and search keys; keep them URL and log friendly.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username"))
    }
}

/// Reject passwords without minimal character diversity.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice.w-42_x").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username(".alice").is_err());
        assert!(validate_username("alice w").is_err());
        assert!(validate_username("alice@home").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse 9").is_ok());
        assert!(validate_password("P4ssword").is_ok());

        assert!(validate_password("lettersonly").is_err());
        assert!(validate_password("1234567890").is_err());
    }
}
