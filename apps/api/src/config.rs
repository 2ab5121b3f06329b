use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or numbers don't parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on each pipeline stage's inference call.
    pub stage_timeout: Duration,
    /// Upper bound on each simulation or rewrite inference call.
    pub simulation_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            stage_timeout: Duration::from_secs(parse_env("STAGE_TIMEOUT_SECS", 90)?),
            simulation_timeout: Duration::from_secs(parse_env("SIMULATION_TIMEOUT_SECS", 60)?),
        })
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
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_default_and_override() {
        std::env::remove_var("JOBFIT_TEST_UNSET_SECS");
        assert_eq!(parse_env("JOBFIT_TEST_UNSET_SECS", 90u64).unwrap(), 90);

        std::env::set_var("JOBFIT_TEST_PORT", " 9090 ");
        assert_eq!(parse_env("JOBFIT_TEST_PORT", 8080u16).unwrap(), 9090);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("JOBFIT_TEST_BAD_SECS", "ninety");
        let err = parse_env("JOBFIT_TEST_BAD_SECS", 90u64).unwrap_err();
        assert!(err.to_string().contains("JOBFIT_TEST_BAD_SECS"));
    }

    #[test]
    fn test_require_env_names_missing_key() {
        std::env::remove_var("JOBFIT_TEST_REQUIRED");
        let err = require_env("JOBFIT_TEST_REQUIRED").unwrap_err();
        assert!(err.to_string().contains("JOBFIT_TEST_REQUIRED"));
    }
}
