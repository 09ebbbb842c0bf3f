use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Studio configuration loaded from environment variables. CLI flags override it.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub cache_path: PathBuf,
    pub output_dir: PathBuf,
    pub export_scale: f32,
    pub export_quality: f32,
    pub export_settle: Duration,
    pub trim_trailing_page: bool,
    /// Where print pages of cache-only resumes are written.
    pub print_dir: PathBuf,
    pub print_settle: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_url: env_or("VITAE_API_URL", "http://localhost:8080"),
            api_token: std::env::var("VITAE_API_TOKEN").ok().filter(|t| !t.is_empty()),
            cache_path: env_or("VITAE_CACHE_PATH", "resumes.v1.json").into(),
            output_dir: env_or("VITAE_OUTPUT_DIR", ".").into(),
            export_scale: parse_env("EXPORT_SCALE", 2.0)?,
            export_quality: parse_env("EXPORT_QUALITY", 1.0)?,
            export_settle: Duration::from_millis(parse_env("EXPORT_SETTLE_MS", 100)?),
            trim_trailing_page: parse_env("EXPORT_TRIM_TRAILING_PAGE", false)?,
            print_dir: std::env::var("VITAE_PRINT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("vitae-print")),
            print_settle: Duration::from_millis(parse_env("PRINT_SETTLE_MS", 400)?),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_defaults_and_errors() {
        assert_eq!(parse_env("VITAE_TEST_UNSET_SCALE", 2.5_f32).unwrap(), 2.5);

        std::env::set_var("VITAE_TEST_BAD_BOOL", "maybe");
        let err = parse_env("VITAE_TEST_BAD_BOOL", false).unwrap_err();
        assert!(err.to_string().contains("VITAE_TEST_BAD_BOOL"));

        std::env::set_var("VITAE_TEST_SETTLE", " 250 ");
        assert_eq!(parse_env("VITAE_TEST_SETTLE", 100_u64).unwrap(), 250);
    }
}
