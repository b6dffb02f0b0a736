//! Configuration manager for Itinera.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name, also the TOTP issuer shown in authenticator apps.
    pub name: String,
    /// Domain name of current instance.
    pub url: String,
    support: Option<String>,
    terms_of_service: Option<String>,
    privacy_policy: Option<String>,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to session token configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to automatic mail sending.
    #[serde(skip_serializing)]
    pub mail: Option<Mail>,
    /// Related to MFA via TOTP configuration.
    #[serde(skip_serializing)]
    pub totp: Option<Totp>,
    /// Related to email-verification token lifetime.
    #[serde(skip_serializing)]
    pub verification: Option<Verification>,
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Mail queue configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    /// Hostname:(?port) for RabbitMQ instance.
    pub address: String,
    /// RabbitMQ default vhost.
    pub vhost: Option<String>,
    /// RabbitMQ username to access queue.
    pub username: String,
    /// RabbitMQ password to access queue.
    pub password: String,
    /// Max channel connections.
    pub pool: Option<u16>,
    /// Queue name to send mailing events.
    pub queue: String,
}

/// TOTP configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totp {
    /// Number of digits for the code.
    pub digits: u32,
    /// Length of a time step, in seconds.
    pub period: u64,
}

impl Default for Totp {
    fn default() -> Self {
        Self {
            digits: crate::totp::DEFAULT_DIGITS,
            period: crate::totp::DEFAULT_PERIOD,
        }
    }
}

/// Session token configuration. The signing secret comes from the `KEY`
/// environment variable, never from this file.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Session lifetime, in minutes.
    pub ttl_minutes: Option<u64>,
}

/// Verification token configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Verification {
    /// Maximum accepted token age, in seconds.
    pub max_age_secs: u64,
}

impl Default for Verification {
    fn default() -> Self {
        Self {
            max_age_secs: crate::verification::DEFAULT_MAX_AGE_SECS,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Session token lifetime in minutes.
    pub fn token_ttl_minutes(&self) -> u64 {
        self.token
            .as_ref()
            .and_then(|token| token.ttl_minutes)
            .unwrap_or(crate::token::DEFAULT_TTL_MINUTES)
    }

    /// Verification token maximum age in seconds.
    pub fn verification_max_age(&self) -> u64 {
        self.verification
            .as_ref()
            .map(|verification| verification.max_age_secs)
            .unwrap_or(crate::verification::DEFAULT_MAX_AGE_SECS)
    }

    /// Number of digits on TOTP codes.
    pub fn totp_digits(&self) -> u32 {
        self.totp
            .as_ref()
            .map(|totp| totp.digits)
            .unwrap_or(crate::totp::DEFAULT_DIGITS)
    }

    /// TOTP time-step length in seconds.
    pub fn totp_period(&self) -> u64 {
        self.totp
            .as_ref()
            .map(|totp| totp.period)
            .unwrap_or(crate::totp::DEFAULT_PERIOD)
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(Arc::new(self.error(err)));
                        },
                    };

                // set app version.
                config.version = VERSION.to_owned();

                // normalize URLs.
                config.url = self.normalize_url(&config.url)?;
                config.terms_of_service = config
                    .terms_of_service
                    .map(|f| self.normalize_url(&f))
                    .transpose()?;
                config.privacy_policy = config
                    .privacy_policy
                    .map(|f| self.normalize_url(&f))
                    .transpose()?;

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            version: VERSION.to_owned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();

        assert_eq!(config.token_ttl_minutes(), 240);
        assert_eq!(config.verification_max_age(), 3600);
        assert_eq!(config.totp_digits(), 6);
        assert_eq!(config.totp_period(), 30);
    }

    #[test]
    fn test_totp_section() {
        let config = Configuration {
            totp: Some(Totp::default()),
            ..Default::default()
        };

        assert_eq!(config.totp_digits(), 6);
        assert_eq!(config.totp_period(), 30);
    }
}
