//! Server configuration read from the environment (optionally via `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("ADMIN_USERNAME and ADMIN_PASSWORD must be set together")]
    PartialAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Bootstrap admin created on startup when the store has none.
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    /// No `JWT_SECRET` was set and a random one is in use; tokens will not
    /// survive a restart.
    pub jwt_secret_generated: bool,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub uploads_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub admin_seed: Option<AdminSeed>,
    pub expose_errors: bool,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = parse_or(get("PORTFOLIO_BIND"), "PORTFOLIO_BIND", SocketAddr::from(([0, 0, 0, 0], 5000)))?;

        let (jwt_secret, jwt_secret_generated) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (
                format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()),
                true,
            ),
        };

        let ttl_days: i64 = parse_or(get("JWT_TTL_DAYS"), "JWT_TTL_DAYS", 7)?;
        if ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_DAYS",
                value: ttl_days.to_string(),
                reason: "must be positive".into(),
            });
        }

        let bcrypt_cost: u32 = parse_or(get("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".into(),
            });
        }

        let admin_seed = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAdmin),
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected 'pretty' or 'json'".into(),
                })
            }
        };

        Ok(Self {
            bind,
            data_dir: get("PORTFOLIO_DATA_DIR").unwrap_or_else(|| "portfolio_data".into()).into(),
            jwt_secret,
            jwt_secret_generated,
            token_ttl: Duration::days(ttl_days),
            bcrypt_cost,
            uploads_dir: get("UPLOADS_DIR").unwrap_or_else(|| "uploads".into()).into(),
            frontend_dir: get("FRONTEND_DIR").unwrap_or_else(|| "frontend/dist".into()).into(),
            admin_seed,
            expose_errors: parse_or(get("EXPOSE_ERRORS"), "EXPOSE_ERRORS", false)?,
            log_format,
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
