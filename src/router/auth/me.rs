//! Current identity.

use axum::{Extension, Json};

use crate::user::{Identity, User};

pub async fn handler(Extension(user): Extension<User>) -> Json<Identity> {
    Json(user.identity())
}
