//! services/site/src/config.rs
//!
//! Defines the site's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Only used when `COOKIE_SECRET` is unset outside production.
const DEVELOPMENT_COOKIE_SECRET: &str = "meadowlark-development-cookie-secret";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The deployment environment, taken from `APP_ENV`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("'{}' is not a known environment", other)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        })
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub environment: Environment,
    pub log_level: Level,
    pub cookie_secret: String,
    pub views_path: PathBuf,
    pub public_path: PathBuf,
    pub uploads_path: PathBuf,
    pub upload_prefix: String,
    pub session_ttl: Duration,
    pub body_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;
        let environment: Environment = parse_var("APP_ENV", "development")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Secrets ---
        let cookie_secret = match std::env::var("COOKIE_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingVar("COOKIE_SECRET".to_string()))
            }
            _ => DEVELOPMENT_COOKIE_SECRET.to_string(),
        };

        // --- Load Filesystem Locations ---
        let views_path = path_var("VIEWS_PATH", "./views");
        let public_path = path_var("PUBLIC_PATH", "./public");
        let uploads_path = path_var("UPLOADS_PATH", "./public/uploads");

        // --- Load Request Handling Settings ---
        let upload_prefix = std::env::var("UPLOAD_PREFIX").unwrap_or_else(|_| "/upload".to_string());
        if !upload_prefix.starts_with('/') || upload_prefix.len() < 2 {
            return Err(ConfigError::InvalidValue(
                "UPLOAD_PREFIX".to_string(),
                format!("'{}' must be an absolute path below '/'", upload_prefix),
            ));
        }
        let upload_prefix = upload_prefix.trim_end_matches('/').to_string();

        let session_ttl = Duration::from_secs(parse_var("SESSION_TTL_SECS", "86400")?);
        let body_limit = parse_var("BODY_LIMIT_BYTES", "10485760")?;

        Ok(Self {
            bind_address,
            environment,
            log_level,
            cookie_secret,
            views_path,
            public_path,
            uploads_path,
            upload_prefix,
            session_ttl,
            body_limit,
        })
    }

    /// A configuration suitable for tests and local tooling: no environment
    /// lookups, paths relative to the working directory.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            environment,
            log_level: Level::INFO,
            cookie_secret: DEVELOPMENT_COOKIE_SECRET.to_string(),
            views_path: PathBuf::from("./views"),
            public_path: PathBuf::from("./public"),
            uploads_path: PathBuf::from("./public/uploads"),
            upload_prefix: "/upload".to_string(),
            session_ttl: Duration::from_secs(86_400),
            body_limit: 10 * 1024 * 1024,
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
