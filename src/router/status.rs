//! Public instance information.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::config::Configuration;

/// Serialize the public part of the configuration; sensitive sections are
/// skipped at the type level.
pub async fn handler(
    State(config): State<Arc<Configuration>>,
) -> Json<Arc<Configuration>> {
    Json(config)
}
