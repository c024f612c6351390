//! Process configuration.
//!
//! Assembled once at startup into an [`AppConfig`] and passed by reference
//! to whatever needs it; nothing else reads the environment.
//!
//! `APP_ENV` picks the profile (`dev` or `prod`). The profile's dotenv file
//! (`configs/.env.<profile>`) is applied before anything else reads the
//! environment, tracing's `RUST_LOG` included; variables already present in
//! the process environment take precedence over it.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid APP_ENV {0:?}: expected dev or prod")]
    InvalidProfile(String),

    #[error("missing required variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("env file {path} not loaded: {reason}")]
    EnvFile { path: String, reason: String },
}

/// Environment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    /// Profile selected by `APP_ENV` (default `dev`).
    pub fn from_env() -> Result<Self, ConfigError> {
        std::env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Dev => "dev",
            Profile::Prod => "prod",
        }
    }

    /// Path of this profile's dotenv file under `dir`.
    pub fn env_file(&self, dir: &Path) -> PathBuf {
        dir.join(format!(".env.{}", self.as_str()))
    }

    /// Export this profile's dotenv file from `dir` into the process
    /// environment. Runs before tracing is set up, so the caller logs the
    /// error.
    pub fn apply_env_file(&self, dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = self.env_file(dir);
        dotenv::from_path(&path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Profile::Dev),
            "prod" => Ok(Profile::Prod),
            other => Err(ConfigError::InvalidProfile(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub url: String,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    /// Require transport encryption.
    pub ssl: bool,
    pub max_connections: u32,
}

/// User created at startup if absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub profile: Profile,
    pub port: u16,
    pub jwt: JwtConfig,
    /// `false` runs on in-memory stores (dev/tests).
    pub use_persistent_stores: bool,
    pub mongo: MongoConfig,
    pub postgres: PostgresConfig,
    pub seed_user: Option<SeedUser>,
}

impl AppConfig {
    /// Read `profile`'s settings from the process environment. Apply the
    /// profile's env file first ([`Profile::apply_env_file`]).
    pub fn from_env(profile: Profile) -> Result<Self, ConfigError> {
        Self::from_lookup(profile, |name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(profile: Profile, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = match (var("JWT_KEY"), profile) {
            (Some(secret), _) => secret,
            (None, Profile::Dev) => {
                tracing::warn!("JWT_KEY not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
            (None, Profile::Prod) => return Err(ConfigError::Missing("JWT_KEY")),
        };

        let use_persistent_stores =
            parse_or("USE_PERSISTENT_STORES", var("USE_PERSISTENT_STORES"), profile == Profile::Prod)?;

        let postgres_url = match var("POSTGRES_URL") {
            Some(url) => url,
            None if use_persistent_stores => return Err(ConfigError::Missing("POSTGRES_URL")),
            None => String::new(),
        };
        let mongo_url = match var("MONGODB_URL") {
            Some(url) => url,
            None if use_persistent_stores => return Err(ConfigError::Missing("MONGODB_URL")),
            None => String::new(),
        };

        let seed_user = match (var("SEED_USERNAME"), var("SEED_PASSWORD")) {
            (Some(username), Some(password)) => Some(SeedUser { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("SEED_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("SEED_USERNAME")),
        };

        Ok(Self {
            profile,
            port: parse_or("PORT", var("PORT"), 5000)?,
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_secs: parse_or("JWT_TTL_SECS", var("JWT_TTL_SECS"), 3600)?,
            },
            use_persistent_stores,
            mongo: MongoConfig {
                url: mongo_url,
                database: var("MONGODB_DATABASE").unwrap_or_else(|| "herois".to_string()),
            },
            postgres: PostgresConfig {
                url: postgres_url,
                ssl: parse_or("SSL_DB", var("SSL_DB"), false)?,
                max_connections: parse_or("POSTGRES_MAX_CONNECTIONS", var("POSTGRES_MAX_CONNECTIONS"), 5)?,
            },
            seed_user,
        })
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
