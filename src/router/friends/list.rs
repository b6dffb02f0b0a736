//! Accepted friendships, both directions.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct FriendEntry {
    pub id: i32,
    pub username: String,
    pub email: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<FriendEntry>>> {
    let friends = sqlx::query_as::<_, FriendEntry>(
        "SELECT u.id, u.username, u.email
            FROM friends f
            JOIN users u
                ON u.id = CASE
                    WHEN f.user_id = $1 THEN f.friend_id
                    ELSE f.user_id
                END
            WHERE (f.user_id = $1 OR f.friend_id = $1)
                AND f.status = 'accepted'
            ORDER BY u.username",
    )
    .bind(user.id)
    .fetch_all(&state.db.postgres)
    .await?;

    Ok(Json(friends))
}
