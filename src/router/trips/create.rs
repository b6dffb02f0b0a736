//! Create a trip.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::trips::{TRIP_FIELDS, Trip};
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Name must be 1 to 120 characters long."
    ))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(
        min = 1,
        max = 50,
        message = "Transport type must be filled."
    ))]
    pub transport_type: String,
    pub transport_option: serde_json::Value,
    pub accommodation: Option<serde_json::Value>,
    pub flight: Option<serde_json::Value>,
    #[validate(range(min = 0.0, message = "Total cost cannot be negative."))]
    pub total_cost: f64,
}

fn dates_out_of_order() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "end_date",
        ValidationError::new("date_order")
            .with_message("End date must not precede start date.".into()),
    );
    errors
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Trip>)> {
    if body.end_date < body.start_date {
        return Err(dates_out_of_order().into());
    }

    let query = format!(
        "INSERT INTO trips (user_id, name, start_date, end_date,
                transport_type, transport_option, accommodation, flight,
                total_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TRIP_FIELDS}"
    );

    let trip = sqlx::query_as::<_, Trip>(&query)
        .bind(user.id)
        .bind(&body.name)
        .bind(body.start_date)
        .bind(body.end_date)
        .bind(&body.transport_type)
        .bind(&body.transport_option)
        .bind(&body.accommodation)
        .bind(&body.flight)
        .bind(body.total_cost)
        .fetch_one(&state.db.postgres)
        .await?;

    tracing::debug!(user_id = user.id, trip_id = trip.id, "trip created");

    Ok((StatusCode::CREATED, Json(trip)))
}
