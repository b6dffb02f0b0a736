//! Delete an owned trip.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::user::User;

/// Shares and feedback rows disappear with the trip (store-level cascade).
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(trip_id): Path<i32>,
) -> Result<StatusCode> {
    let result =
        sqlx::query("DELETE FROM trips WHERE id = $1 AND user_id = $2")
            .bind(trip_id)
            .bind(user.id)
            .execute(&state.db.postgres)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ServerError::NotFound("trip"));
    }

    Ok(StatusCode::NO_CONTENT)
}
