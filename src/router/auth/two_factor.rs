//! Second-factor enrollment.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::bearer;
use crate::router::Valid;
use crate::totp;
use crate::user::{User, UserRepository};

#[derive(Debug, Deserialize)]
pub struct SetupParams {
    /// Setup token handed out by email verification, for clients without a
    /// session yet.
    token: Option<String>,
}

/// Material for the authenticator app. The secret leaves the server only
/// here, at (re-)enrollment.
#[derive(Debug, Serialize, Deserialize)]
pub struct Provisioning {
    pub otpauth_uri: String,
    pub secret: String,
}

/// Enroll the authenticator app.
///
/// Reachable with a session token or with the setup token from email
/// verification. Generates the shared secret only when absent; an enrolled
/// secret is never silently rotated.
pub async fn setup(
    State(state): State<AppState>,
    Query(params): Query<SetupParams>,
    headers: HeaderMap,
) -> Result<Json<Provisioning>> {
    let repo = UserRepository::new(state.db.postgres.clone());

    let email = match bearer(&headers)
        .and_then(|token| state.token.decode(token).ok())
    {
        Some(claims) => claims.sub,
        None => {
            let token =
                params.token.as_deref().ok_or(ServerError::Unauthorized)?;
            state
                .otp_setup
                .decode(token, state.config.verification_max_age())
                .map_err(|_| ServerError::InvalidToken)?
        },
    };

    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    if !user.is_email_verified {
        return Err(ServerError::EmailNotVerified);
    }

    let secret = match user.otp_secret.as_deref() {
        Some(secret) if !secret.is_empty() => secret.to_owned(),
        _ => {
            let secret = totp::generate_secret();
            repo.set_otp_secret(user.id, &secret).await?;
            secret
        },
    };

    let otpauth_uri =
        totp::provisioning_uri(&user.email, &secret, &state.config.name)?;

    Ok(Json(Provisioning { otpauth_uri, secret }))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetBody {
    pub password: String,
    pub otp_code: String,
}

/// Explicit secret rotation, invalidating any enrolled authenticator.
///
/// Requires fresh proof of both factors on top of the session.
pub async fn reset(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<ResetBody>,
) -> Result<Json<Provisioning>> {
    if !state.crypto.verify_password(&body.password, &user.password) {
        return Err(ServerError::Credentials);
    }
    if !totp::verify(
        user.otp_secret.as_deref(),
        &body.otp_code,
        state.config.totp_period(),
        state.config.totp_digits(),
    ) {
        return Err(ServerError::SecondFactor);
    }

    let secret = totp::generate_secret();
    UserRepository::new(state.db.postgres.clone())
        .set_otp_secret(user.id, &secret)
        .await?;
    tracing::info!(user_id = user.id, "totp secret rotated");

    let otpauth_uri =
        totp::provisioning_uri(&user.email, &secret, &state.config.name)?;

    Ok(Json(Provisioning { otpauth_uri, secret }))
}

/// Provisioning URI for an already-stored secret, if any.
pub(super) fn provisioning_uri(
    state: &AppState,
    user: &User,
) -> Option<String> {
    let secret = user.otp_secret.as_deref().filter(|s| !s.is_empty())?;
    totp::provisioning_uri(&user.email, secret, &state.config.name).ok()
}
