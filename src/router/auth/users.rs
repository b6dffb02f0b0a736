//! Account lookup and administration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::user::{Identity, User, UserRepository};

const MIN_SEARCH_LENGTH: usize = 2;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    search: Option<String>,
}

/// Search accounts by username or email fragment, excluding the caller.
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Identity>>> {
    let fragment = params.search.unwrap_or_default();
    if fragment.trim().len() < MIN_SEARCH_LENGTH {
        return Ok(Json(Vec::new()));
    }

    let found = UserRepository::new(state.db.postgres.clone())
        .search(fragment.trim(), user.id)
        .await?;

    Ok(Json(found))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveBody {
    pub is_active: bool,
}

/// Disable or re-enable an account. Administrators only.
pub async fn set_active(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<i32>,
    Json(body): Json<ActiveBody>,
) -> Result<StatusCode> {
    if admin.id == user_id {
        return Err(ServerError::Forbidden(
            "cannot change your own active flag",
        ));
    }

    let updated = UserRepository::new(state.db.postgres.clone())
        .set_active(user_id, body.is_active)
        .await?;
    if !updated {
        return Err(ServerError::NotFound("user"));
    }

    tracing::info!(
        admin_id = admin.id,
        user_id,
        active = body.is_active,
        "account active flag changed"
    );

    Ok(StatusCode::NO_CONTENT)
}
