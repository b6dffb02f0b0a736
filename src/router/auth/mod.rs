//! Account and session HTTP API.

mod login;
mod me;
mod register;
mod two_factor;
mod users;
mod verify_email;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};

use crate::AppState;
use crate::middleware as gate;

pub const TOKEN_TYPE: &str = "Bearer";

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // `GET /auth/me` goes to `me`. Authorization required.
        .route("/me", get(me::handler))
        // `POST /auth/reset-2fa` rotates the TOTP secret.
        .route("/reset-2fa", post(two_factor::reset))
        // `GET /auth/users?search=` goes to `users::search`.
        .route("/users", get(users::search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ));

    let admin = Router::new()
        // `PATCH /auth/users/:ID/active` disables or re-enables an account.
        .route("/users/{user_id}/active", patch(users::set_active))
        .route_layer(middleware::from_fn(gate::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ));

    Router::new()
        // `POST /auth/register` goes to `register`.
        .route("/register", post(register::handler))
        // `GET /auth/verify-email?token=` goes to `verify_email`.
        .route("/verify-email", get(verify_email::handler))
        // `POST /auth/login` goes to `login`.
        .route("/login", post(login::handler))
        // `POST /auth/setup-2fa` enrolls the authenticator app.
        .route("/setup-2fa", post(two_factor::setup))
        .merge(protected)
        .merge(admin)
}
