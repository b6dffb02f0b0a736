//! Account creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::mail::Template::Verify;
use crate::router::{Message, Valid};
use crate::totp;
use crate::user::UserRepository;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(
        length(
            min = 2,
            max = 32,
            message = "Username must be 2 to 32 characters long."
        ),
        custom(
            function = "crate::router::validate_username",
            message = "Username must be alphanumeric."
        )
    )]
    pub username: String,
    #[validate(
        length(
            min = 8,
            max = 255,
            message = "Password must contain at least 8 characters."
        ),
        custom(
            function = "crate::router::validate_password",
            message = "Password is too weak."
        )
    )]
    pub password: String,
}

/// Handler to create user.
///
/// The account starts unverified; the TOTP secret is minted here so login
/// demands a second factor from the very first session.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Message>)> {
    let repo = UserRepository::new(state.db.postgres.clone());
    let email = body.email.to_lowercase();

    // First duplicate wins for the reported field.
    if repo.find_by_email(&email).await?.is_some() {
        return Err(ServerError::Conflict(
            "An account with this email already exists.",
        ));
    }
    if repo.find_by_username(&body.username).await?.is_some() {
        return Err(ServerError::Conflict(
            "An account with this username already exists.",
        ));
    }

    let password = state.crypto.hash_password(&body.password)?;
    let otp_secret = totp::generate_secret();
    let user = repo
        .insert(&email, &body.username, &password, &otp_secret)
        .await?;

    let token = state.verify_email.issue(&user.email);
    let link = format!("{}verify-email?token={token}", state.config.url);
    if let Err(err) = state
        .mail
        .publish_event(Verify, &user.email, &user.username, &link)
        .await
    {
        // Registration stands even when delivery is down.
        tracing::error!(
            user_id = user.id,
            error = %err,
            "verification mail not published"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(Message::new(
            "Registration successful. Check your inbox to verify this address.",
        )),
    ))
}
