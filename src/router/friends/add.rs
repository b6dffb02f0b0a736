//! Send a friend request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::{Message, Valid};
use crate::router::friends::FriendStatus;
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(range(min = 1))]
    pub friend_id: i32,
}

fn self_request() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "friend_id",
        ValidationError::new("self_request")
            .with_message("Cannot send a friend request to yourself.".into()),
    );
    errors
}

/// The acting side always comes from the session, never from the body.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Message>)> {
    if body.friend_id == user.id {
        return Err(self_request().into());
    }

    let target: Option<i32> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(body.friend_id)
            .fetch_optional(&state.db.postgres)
            .await?;
    if target.is_none() {
        return Err(ServerError::NotFound("user"));
    }

    let existing: Option<(i32, FriendStatus)> = sqlx::query_as(
        "SELECT id, status FROM friends
            WHERE user_id = $1 AND friend_id = $2",
    )
    .bind(user.id)
    .bind(body.friend_id)
    .fetch_optional(&state.db.postgres)
    .await?;

    if let Some((request_id, status)) = existing {
        match status {
            // A rejected request may be sent again; drop the old row.
            FriendStatus::Rejected => {
                sqlx::query("DELETE FROM friends WHERE id = $1")
                    .bind(request_id)
                    .execute(&state.db.postgres)
                    .await?;
            },
            FriendStatus::Pending => {
                return Err(ServerError::Conflict(
                    "Friend request is already pending.",
                ));
            },
            FriendStatus::Accepted => {
                return Err(ServerError::Conflict("You are already friends."));
            },
        }
    }

    sqlx::query(
        "INSERT INTO friends (user_id, friend_id, status)
            VALUES ($1, $2, 'pending')",
    )
    .bind(user.id)
    .bind(body.friend_id)
    .execute(&state.db.postgres)
    .await
    .map_err(|err| {
        ServerError::or_conflict(err, "Friend request is already pending.")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(Message::new("Friend request sent.")),
    ))
}
