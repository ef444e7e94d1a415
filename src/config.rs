//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::fmt;

/// HMAC signing secret for access tokens.
///
/// `Debug` never prints the secret bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Secret used to sign and verify access tokens
    pub jwt_secret: SigningSecret,

    /// Access token lifetime in seconds
    pub token_ttl_seconds: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        // Tokens cannot be issued or checked without a secret, so refuse to start.
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingEnv("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SECRET"));
        }

        let token_ttl_seconds: i64 = lookup("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_SECONDS"))?;
        if token_ttl_seconds <= 0 || token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_SECONDS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret: SigningSecret::new(jwt_secret),
            token_ttl_seconds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
