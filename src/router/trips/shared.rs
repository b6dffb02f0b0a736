//! Trips shared with the caller.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::router::trips::Trip;
use crate::user::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedBy {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedTrip {
    pub shared_trip_id: i32,
    pub shared_by: SharedBy,
    pub trip: Trip,
}

#[derive(sqlx::FromRow)]
struct Row {
    shared_trip_id: i32,
    shared_by_id: i32,
    shared_by_username: String,
    shared_by_email: String,
    #[sqlx(flatten)]
    trip: Trip,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<SharedTrip>>> {
    let rows = sqlx::query_as::<_, Row>(
        "SELECT st.id AS shared_trip_id,
                u.id AS shared_by_id,
                u.username AS shared_by_username,
                u.email AS shared_by_email,
                t.id, t.user_id, t.name, t.start_date, t.end_date,
                t.transport_type, t.transport_option, t.accommodation,
                t.flight, t.total_cost, t.created_at
            FROM shared_trips st
            JOIN trips t ON t.id = st.trip_id
            JOIN users u ON u.id = st.shared_by
            WHERE st.shared_with = $1
            ORDER BY st.created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db.postgres)
    .await?;

    let shared = rows
        .into_iter()
        .map(|row| SharedTrip {
            shared_trip_id: row.shared_trip_id,
            shared_by: SharedBy {
                id: row.shared_by_id,
                username: row.shared_by_username,
                email: row.shared_by_email,
            },
            trip: row.trip,
        })
        .collect();

    Ok(Json(shared))
}
