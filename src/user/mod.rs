mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account privilege level.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    #[serde(skip)]
    pub otp_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public fields of a [`User`]. Never carries the password hash nor the
/// OTP secret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Public projection returned by `/auth/me` and user search.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}
