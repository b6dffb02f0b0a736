//! Friendship HTTP API.

mod add;
mod list;
mod remove;
mod requests;
mod respond;

use axum::routing::{delete, get, post};
use axum::{Router, middleware};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::middleware as gate;

/// Friendship lifecycle states.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "friend_status", rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Rejected,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `POST /friends` sends a request, `GET /friends` lists friends.
        .route("/", post(add::handler).get(list::handler))
        // `POST /friends/respond` accepts or rejects a pending request.
        .route("/respond", post(respond::handler))
        // `GET /friends/requests` lists requests addressed to the caller.
        .route("/requests", get(requests::handler))
        // `DELETE /friends/:ID` removes an accepted friendship.
        .route("/{friend_id}", delete(remove::handler))
        .route_layer(middleware::from_fn_with_state(state, gate::authenticate))
}
