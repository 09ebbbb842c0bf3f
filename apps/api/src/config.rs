use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_days: i64,
    pub login_max_attempts: u32,
    pub login_lockout: Duration,
    pub print_settle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_ttl_days: parse_env("SESSION_TTL_DAYS", 30)?,
            login_max_attempts: parse_env("LOGIN_MAX_ATTEMPTS", 5)?,
            login_lockout: Duration::from_secs(parse_env("LOGIN_LOCKOUT_SECS", 15 * 60)?),
            print_settle: Duration::from_millis(parse_env("PRINT_SETTLE_MS", 400)?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: String::new(),
            port: 8080,
            rust_log: "info".to_string(),
            session_ttl_days: 30,
            login_max_attempts: 5,
            login_lockout: Duration::from_secs(15 * 60),
            print_settle: Duration::from_millis(400),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
