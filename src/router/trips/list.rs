//! List own trips.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::router::trips::{TRIP_FIELDS, Trip};
use crate::user::User;

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Trip>>> {
    let query = format!(
        "SELECT {TRIP_FIELDS} FROM trips
            WHERE user_id = $1
            ORDER BY created_at DESC"
    );

    let trips = sqlx::query_as::<_, Trip>(&query)
        .bind(user.id)
        .fetch_all(&state.db.postgres)
        .await?;

    Ok(Json(trips))
}
