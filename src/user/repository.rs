//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::user::{Identity, User};

const USER_FIELDS: &str = "id, email, username, password, role, is_active, \
                           is_email_verified, otp_secret, created_at";

const MAX_SEARCH_RESULTS: i64 = 20;

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new account. Race losers on the unique constraints get the
    /// same per-field conflict as the pre-checks.
    pub async fn insert(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        otp_secret: &str,
    ) -> Result<User> {
        let query = format!(
            "INSERT INTO users (email, username, password, otp_secret)
                VALUES ($1, $2, $3, $4)
                RETURNING {USER_FIELDS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(username)
            .bind(password_hash)
            .bind(otp_secret)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match conflict_field(&err) {
                Some(field) => ServerError::Conflict(field),
                None => err.into(),
            })
    }

    /// Find account using `email` field. Emails compare lowercased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = get_by_field_query(Field::Email);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find account using `username` field.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>> {
        let query = get_by_field_query(Field::Username);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Mark the account email as verified.
    pub async fn set_email_verified(&self, user_id: i32) -> Result<()> {
        sqlx::query("UPDATE users SET is_email_verified = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store a new TOTP shared secret.
    pub async fn set_otp_secret(
        &self,
        user_id: i32,
        secret: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET otp_secret = $1 WHERE id = $2")
            .bind(secret)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Enable or disable an account. Returns whether the account exists.
    pub async fn set_active(&self, user_id: i32, active: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
                .bind(active)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Search accounts by username or email fragment.
    pub async fn search(
        &self,
        fragment: &str,
        exclude_user_id: i32,
    ) -> Result<Vec<Identity>> {
        let pattern = format!(
            "%{}%",
            fragment
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        );

        let found = sqlx::query_as::<_, Identity>(
            "SELECT id, username, email, role FROM users
                WHERE (username ILIKE $1 OR email ILIKE $1) AND id <> $2
                ORDER BY username
                LIMIT $3",
        )
        .bind(pattern)
        .bind(exclude_user_id)
        .bind(MAX_SEARCH_RESULTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }
}

#[derive(Debug, Clone)]
enum Field {
    Email,
    Username,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Email => write!(f, "email"),
            Field::Username => write!(f, "username"),
        }
    }
}

fn get_by_field_query(field: Field) -> String {
    format!("SELECT {USER_FIELDS} FROM users WHERE {field} = $1")
}

fn conflict_field(err: &sqlx::Error) -> Option<&'static str> {
    let db = err.as_database_error()?;
    if !db.is_unique_violation() {
        return None;
    }

    match db.constraint() {
        Some(name) if name.contains("email") => {
            Some("An account with this email already exists.")
        },
        Some(name) if name.contains("username") => {
            Some("An account with this username already exists.")
        },
        _ => Some("An account with these details already exists."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_queries() {
        assert_eq!(
            get_by_field_query(Field::Email),
            format!("SELECT {USER_FIELDS} FROM users WHERE email = $1")
        );
        assert!(get_by_field_query(Field::Username).ends_with("username = $1"));
    }
}
