//! Remove an accepted friendship.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Message;
use crate::user::User;

/// Either side may end the friendship.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(friend_id): Path<i32>,
) -> Result<Json<Message>> {
    let result = sqlx::query(
        "DELETE FROM friends
            WHERE status = 'accepted'
                AND ((user_id = $1 AND friend_id = $2)
                    OR (user_id = $2 AND friend_id = $1))",
    )
    .bind(user.id)
    .bind(friend_id)
    .execute(&state.db.postgres)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ServerError::NotFound("friend"));
    }

    Ok(Json(Message::new("Friend removed.")))
}
