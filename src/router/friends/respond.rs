//! Accept or reject a pending friend request.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Message;
use crate::user::User;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Accept,
    Reject,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Body {
    pub request_id: i32,
    pub action: Action,
}

/// Only the recipient of a pending request may answer it; anything else
/// looks like a missing request.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<Body>,
) -> Result<Json<Message>> {
    let status = match body.action {
        Action::Accept => "accepted",
        Action::Reject => "rejected",
    };

    let result = sqlx::query(
        "UPDATE friends SET status = $1::friend_status
            WHERE id = $2 AND friend_id = $3 AND status = 'pending'",
    )
    .bind(status)
    .bind(body.request_id)
    .bind(user.id)
    .execute(&state.db.postgres)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ServerError::NotFound("friend request"));
    }

    Ok(Json(Message::new(match body.action {
        Action::Accept => "Friend request accepted.",
        Action::Reject => "Friend request rejected.",
    })))
}
