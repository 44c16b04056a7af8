//! Configuration management for the credential service
//!
//! Loads and validates configuration from environment variables (and an
//! optional `.env` file). Everything is read once at startup; the resulting
//! structs are immutable for the lifetime of the process.

use chrono::Duration;
use std::env;
use std::fmt;
use thiserror::Error;

/// Longest accepted token lifetime (ten years)
const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Signing secrets for the two token kinds.
///
/// Constructed once at startup and handed to the token manager. The two
/// values must differ; a token signed with one must never verify under the
/// other.
#[derive(Clone)]
pub struct TokenSecrets {
    pub access_secret: String,
    pub refresh_secret: String,
}

impl TokenSecrets {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
        }
    }
}

impl fmt::Debug for TokenSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSecrets")
            .field("access_secret", &"****")
            .field("refresh_secret", &"****")
            .finish()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Current environment
    pub environment: Environment,

    /// Interface to bind
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Access and refresh signing secrets
    pub token_secrets: TokenSecrets,

    /// Access token lifetime (default: 15 minutes)
    pub access_token_ttl: Duration,

    /// Refresh token lifetime (default: 7 days)
    pub refresh_token_ttl: Duration,

    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let database_url = match lookup("DATABASE_URL") {
            Some(url) if !url.is_empty() => url,
            _ => database_url_from_parts(&lookup)?,
        };

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").filter(|v| !v.is_empty());

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let access_secret = required(&lookup, "ACCESS_SECRET")?;
        let refresh_secret = required(&lookup, "REFRESH_SECRET")?;
        if access_secret == refresh_secret {
            return Err(ConfigError::InvalidValue(
                "ACCESS_SECRET and REFRESH_SECRET must differ".to_string(),
            ));
        }

        let access_token_ttl = token_ttl(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 900)?;
        let refresh_token_ttl = token_ttl(&lookup, "REFRESH_TOKEN_TTL_SECONDS", 7 * 24 * 60 * 60)?;

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(v) => {
                let cost = v.parse::<u32>().map_err(|_| {
                    ConfigError::InvalidValue(format!("BCRYPT_COST must be a number, got '{}'", v))
                })?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::InvalidValue(format!(
                        "BCRYPT_COST must be between 4 and 31, got {}",
                        cost
                    )));
                }
                cost
            }
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Config {
            database_url,
            environment,
            host,
            port,
            db_max_connections,
            cors_allowed_origins,
            log_level,
            token_secrets: TokenSecrets::new(access_secret, refresh_secret),
            access_token_ttl,
            refresh_token_ttl,
            bcrypt_cost,
        })
    }

    /// Database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> String {
        let url = &self.database_url;
        let Some(userinfo_start) = url.find("://").map(|i| i + 3) else {
            return url.clone();
        };
        let authority_end = url[userinfo_start..]
            .find(['/', '?'])
            .map_or(url.len(), |i| userinfo_start + i);

        // The password may itself contain '@' or ':'; the host follows the last '@'
        let Some(at_pos) = url[userinfo_start..authority_end]
            .rfind('@')
            .map(|i| userinfo_start + i)
        else {
            return url.clone();
        };
        let Some(colon_pos) = url[userinfo_start..at_pos]
            .find(':')
            .map(|i| userinfo_start + i)
        else {
            return url.clone();
        };

        format!("{}****{}", &url[..=colon_pos], &url[at_pos..])
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

fn token_ttl<F>(lookup: &F, key: &str, default_seconds: i64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(Duration::seconds(default_seconds));
    };
    match raw.parse::<i64>() {
        Ok(v) if v > 0 && v <= MAX_TOKEN_TTL_SECONDS => Ok(Duration::seconds(v)),
        _ => Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {} seconds, got '{}'",
            key, MAX_TOKEN_TTL_SECONDS, raw
        ))),
    }
}

/// Assemble a Postgres URL from the discrete DB_* variables.
fn database_url_from_parts<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("DB_HOST")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;
    let port = lookup("DB_PORT").unwrap_or_else(|| "5432".to_string());
    let user = required(lookup, "DB_USERNAME")?;
    let password = lookup("DB_PASSWORD").unwrap_or_default();
    let dbname = required(lookup, "DB_NAME")?;
    let sslmode = lookup("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());

    let credentials = if password.is_empty() {
        user
    } else {
        format!("{}:{}", user, password)
    };

    Ok(format!(
        "postgres://{}@{}:{}/{}?sslmode={}",
        credentials, host, port, dbname, sslmode
    ))
}
