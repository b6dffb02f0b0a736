//! Pending friend requests addressed to the caller.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct FriendRequest {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub email: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<FriendRequest>>> {
    let requests = sqlx::query_as::<_, FriendRequest>(
        "SELECT f.id, f.user_id, u.username, u.email
            FROM friends f
            JOIN users u ON u.id = f.user_id
            WHERE f.friend_id = $1 AND f.status = 'pending'
            ORDER BY f.id",
    )
    .bind(user.id)
    .fetch_all(&state.db.postgres)
    .await?;

    Ok(Json(requests))
}
