//! Email-verification link target.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::auth::two_factor;
use crate::user::UserRepository;

#[derive(Debug, Deserialize)]
pub struct Params {
    token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
    /// Short-lived credential for `POST /auth/setup-2fa`, only on the first
    /// successful verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otpauth_uri: Option<String>,
}

/// Consume a verification token from the emailed link.
///
/// Verifying twice is idempotent. The first success also hands back the
/// second-factor enrollment material: login requires a TOTP code from the
/// start, so the authenticator must be enrollable before the first session.
pub async fn handler(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Response>> {
    let email = state
        .verify_email
        .decode(&params.token, state.config.verification_max_age())
        .map_err(|_| ServerError::InvalidToken)?;

    let repo = UserRepository::new(state.db.postgres.clone());
    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or(ServerError::NotFound("user"))?;

    if user.is_email_verified {
        return Ok(Json(Response {
            message: "Email is already verified.".to_owned(),
            setup_token: None,
            otpauth_uri: None,
        }));
    }

    repo.set_email_verified(user.id).await?;
    tracing::info!(user_id = user.id, "email verified");

    Ok(Json(Response {
        message: "Email verified.".to_owned(),
        setup_token: Some(state.otp_setup.issue(&user.email)),
        otpauth_uri: two_factor::provisioning_uri(&state, &user),
    }))
}
