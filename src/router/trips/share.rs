//! Share an owned trip with a friend.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::{Message, Valid};
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(range(min = 1))]
    pub trip_id: i32,
    #[validate(range(min = 1))]
    pub friend_id: i32,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Message>)> {
    let owned: Option<i32> = sqlx::query_scalar(
        "SELECT id FROM trips WHERE id = $1 AND user_id = $2",
    )
    .bind(body.trip_id)
    .bind(user.id)
    .fetch_optional(&state.db.postgres)
    .await?;
    if owned.is_none() {
        return Err(ServerError::NotFound("trip"));
    }

    // Trips travel along accepted friendships only.
    let friendship: Option<i32> = sqlx::query_scalar(
        "SELECT id FROM friends
            WHERE status = 'accepted'
                AND ((user_id = $1 AND friend_id = $2)
                    OR (user_id = $2 AND friend_id = $1))",
    )
    .bind(user.id)
    .bind(body.friend_id)
    .fetch_optional(&state.db.postgres)
    .await?;
    if friendship.is_none() {
        return Err(ServerError::Forbidden(
            "trips can only be shared with friends",
        ));
    }

    sqlx::query(
        "INSERT INTO shared_trips (trip_id, shared_by, shared_with)
            VALUES ($1, $2, $3)",
    )
    .bind(body.trip_id)
    .bind(user.id)
    .bind(body.friend_id)
    .execute(&state.db.postgres)
    .await
    .map_err(|err| {
        ServerError::or_conflict(
            err,
            "Trip is already shared with this user.",
        )
    })?;

    Ok((StatusCode::CREATED, Json(Message::new("Trip shared."))))
}
