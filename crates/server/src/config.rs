//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TAVOLA_DATABASE_URL` - `PostgreSQL` connection string
//! - `TAVOLA_BASE_URL` - Public URL for the API
//! - `TAVOLA_SESSION_SECRET` - Session signing secret (min 32 chars)
//!
//! ## Optional
//! - `TAVOLA_HOST` - Bind address (default: 127.0.0.1)
//! - `TAVOLA_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Tavola server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value
    /// cannot be parsed, or the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require_env("TAVOLA_DATABASE_URL")?;
        let base_url = require_env("TAVOLA_BASE_URL")?;
        let session_secret = require_env("TAVOLA_SESSION_SECRET")?;

        validate_secret("TAVOLA_SESSION_SECRET", &session_secret)?;

        let host: IpAddr = optional_env("TAVOLA_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TAVOLA_HOST".to_owned(), format!("{e}"))
            })?;

        let port: u16 = optional_env("TAVOLA_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TAVOLA_PORT".to_owned(), format!("{e}"))
            })?;

        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            base_url,
            session_secret: SecretString::from(session_secret),
            sentry_dsn: optional_env("SENTRY_DSN"),
            sentry_environment: optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// The socket address to bind the listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public base URL is served over HTTPS (controls the
    /// Secure flag on session cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_rate(name: &str, default: f32) -> Result<f32, ConfigError> {
    match optional_env(name) {
        None => Ok(default),
        Some(raw) => {
            let rate: f32 = raw
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), format!("{e}")))?;
            if (0.0..=1.0).contains(&rate) {
                Ok(rate)
            } else {
                Err(ConfigError::InvalidEnvVar(
                    name.to_owned(),
                    "must be between 0.0 and 1.0".to_owned(),
                ))
            }
        }
    }
}

/// Reject secrets that are too short or look like unfilled placeholders.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_owned(),
                format!("looks like a placeholder (contains {pattern:?})"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_rejected() {
        assert!(matches!(
            validate_secret("T", "short"),
            Err(ConfigError::InsecureSecret(..))
        ));
    }

    #[test]
    fn placeholder_secrets_are_rejected() {
        let value = "changeme-changeme-changeme-changeme";
        assert!(matches!(
            validate_secret("T", value),
            Err(ConfigError::InsecureSecret(..))
        ));
    }

    #[test]
    fn high_entropy_secrets_pass() {
        let value = "kP9mQ2vL8xR4nT6wJ3bZ7cF1dG5hY0aEuI";
        assert!(validate_secret("T", value).is_ok());
    }

    #[test]
    fn rate_defaults_apply_when_unset() {
        assert!((parse_rate("TAVOLA_UNSET_RATE", 0.5).unwrap() - 0.5).abs() < f32::EPSILON);
    }
}
