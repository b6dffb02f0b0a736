//! Authorization gate.
//!
//! Every request re-derives its authorization level from the bearer token
//! it carries; there is no session affinity and no server-side state.

use axum::Extension;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{Result, ServerError};
use crate::user::{Role, User, UserRepository};
use crate::AppState;

pub(crate) const BEARER: &str = "Bearer ";

/// Extract the bearer credential from an `Authorization`-style header.
pub(crate) fn bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|token| token.strip_prefix(BEARER).unwrap_or(token))
}

/// Custom middleware for authentication.
///
/// Resolves the acting [`User`] from the session token and stores it as a
/// request extension. A signed token whose subject no longer resolves is
/// treated exactly like a forged one.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer(req.headers()).ok_or(ServerError::Unauthorized)?;
    let claims = state.token.decode(token)?;

    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_email(&claims.sub)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    if !user.is_active {
        return Err(ServerError::Forbidden("account is disabled"));
    }

    req.extensions_mut().insert::<User>(user);
    Ok(next.run(req).await)
}

/// Restrict a route to administrators. Layered on top of [`authenticate`].
pub async fn require_admin(
    Extension(user): Extension<User>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if user.role != Role::Admin {
        return Err(ServerError::Forbidden("not enough permissions"));
    }

    Ok(next.run(req).await)
}
