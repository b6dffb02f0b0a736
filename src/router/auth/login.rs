//! Credential and second-factor check.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::router::auth::TOKEN_TYPE;
use crate::totp;
use crate::user::UserRepository;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    pub password: String,
    pub otp_code: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Handle login route and check if everything is valid.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let repo = UserRepository::new(state.db.postgres.clone());

    // Unknown account, wrong password and disabled account share one
    // answer: nothing here may confirm that an address is registered.
    let Some(user) = repo.find_by_email(&body.email.to_lowercase()).await?
    else {
        return Err(ServerError::Credentials);
    };
    if !state.crypto.verify_password(&body.password, &user.password) {
        return Err(ServerError::Credentials);
    }
    if !user.is_active {
        return Err(ServerError::Credentials);
    }

    // An unverified address must never complete second-factor login.
    if !user.is_email_verified {
        return Err(ServerError::EmailNotVerified);
    }

    let code = body.otp_code.as_deref().unwrap_or_default();
    if !totp::verify(
        user.otp_secret.as_deref(),
        code,
        state.config.totp_period(),
        state.config.totp_digits(),
    ) {
        // The first factor already passed, a distinct error is fine.
        return Err(ServerError::SecondFactor);
    }

    let token = state.token.create(&user.email, user.role)?;
    tracing::debug!(user_id = user.id, "session opened");

    Ok(Json(Response {
        token,
        token_type: TOKEN_TYPE.to_owned(),
        expires_in: state.token.expires_in(),
    }))
}
