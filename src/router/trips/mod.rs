//! Trips HTTP API: ownership, sharing and feedback.

mod create;
mod feedback;
mod list;
mod remove;
mod share;
mod shared;

use axum::routing::{delete, get, post};
use axum::{Router, middleware};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::middleware as gate;

/// Trip as saved on database. Transport, accommodation and flight payloads
/// stay opaque documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trip {
    pub id: i32,
    #[serde(skip)]
    pub user_id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub transport_type: String,
    pub transport_option: serde_json::Value,
    pub accommodation: Option<serde_json::Value>,
    pub flight: Option<serde_json::Value>,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

const TRIP_FIELDS: &str = "id, user_id, name, start_date, end_date, \
                           transport_type, transport_option, accommodation, \
                           flight, total_cost, created_at";

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `POST /trips` creates, `GET /trips` lists own trips.
        .route("/", post(create::handler).get(list::handler))
        // `DELETE /trips/:ID` removes an owned trip.
        .route("/{trip_id}", delete(remove::handler))
        // `POST /trips/share` shares an owned trip with a friend.
        .route("/share", post(share::handler))
        // `GET /trips/shared` lists trips shared with the caller.
        .route("/shared", get(shared::handler))
        // `POST /trips/feedback` leaves feedback on a received share.
        .route("/feedback", post(feedback::create))
        // `GET /trips/shared-feedbacks/:ID` lists feedback on a share.
        .route("/shared-feedbacks/{shared_trip_id}", get(feedback::list))
        .route_layer(middleware::from_fn_with_state(state, gate::authenticate))
}
