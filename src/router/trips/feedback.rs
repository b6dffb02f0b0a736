//! Feedback on shared trips.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(range(min = 1))]
    pub shared_trip_id: i32,
    #[validate(range(min = 1, max = 5, message = "Rating must be 1 to 5."))]
    pub rating: i32,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be 1 to 500 characters long."
    ))]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i32,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub user: FeedbackUser,
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i32,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
    user_id: i32,
    username: String,
    email: String,
}

impl From<Row> for Feedback {
    fn from(row: Row) -> Self {
        Self {
            id: row.id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            user: FeedbackUser {
                id: row.user_id,
                username: row.username,
                email: row.email,
            },
        }
    }
}

/// Leave feedback on a trip shared with the caller, once per share.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Feedback>)> {
    let shared_with: Option<i32> = sqlx::query_scalar(
        "SELECT shared_with FROM shared_trips WHERE id = $1",
    )
    .bind(body.shared_trip_id)
    .fetch_optional(&state.db.postgres)
    .await?;

    let Some(shared_with) = shared_with else {
        return Err(ServerError::NotFound("shared trip"));
    };
    if shared_with != user.id {
        return Err(ServerError::Forbidden(
            "feedback is only open to the share recipient",
        ));
    }

    let row = sqlx::query_as::<_, Row>(
        "INSERT INTO shared_trip_feedback
                (shared_trip_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, rating, comment, created_at,
                user_id, $5::text AS username, $6::text AS email",
    )
    .bind(body.shared_trip_id)
    .bind(user.id)
    .bind(body.rating)
    .bind(&body.comment)
    .bind(&user.username)
    .bind(&user.email)
    .fetch_one(&state.db.postgres)
    .await
    .map_err(|err| ServerError::or_conflict(err, "Feedback already left."))?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// Feedback listing, visible to the two sides of the share.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(shared_trip_id): Path<i32>,
) -> Result<Json<Vec<Feedback>>> {
    let share: Option<(i32, i32)> = sqlx::query_as(
        "SELECT shared_by, shared_with FROM shared_trips WHERE id = $1",
    )
    .bind(shared_trip_id)
    .fetch_optional(&state.db.postgres)
    .await?;

    let Some((shared_by, shared_with)) = share else {
        return Err(ServerError::NotFound("shared trip"));
    };
    if user.id != shared_by && user.id != shared_with {
        return Err(ServerError::Forbidden(
            "feedback is only visible to the share participants",
        ));
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT fb.id, fb.rating, fb.comment, fb.created_at,
                u.id AS user_id, u.username, u.email
            FROM shared_trip_feedback fb
            JOIN users u ON u.id = fb.user_id
            WHERE fb.shared_trip_id = $1
            ORDER BY fb.created_at",
    )
    .bind(shared_trip_id)
    .fetch_all(&state.db.postgres)
    .await?;

    Ok(Json(rows.into_iter().map(Feedback::from).collect()))
}
