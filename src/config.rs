//! Worker configuration from environment variables

use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SANDBOX_URL: &str = "https://emkc.org/api/v2/piston";
const DEFAULT_SANDBOX_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SANDBOX_COMPILE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SANDBOX_RUN_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_SANDBOX_MIN_INTERVAL_MS: u64 = 250;
const DEFAULT_SANDBOX_MAX_CONCURRENCY: usize = 1;
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeConfig {
    /// Base URL of the Piston-compatible sandbox
    pub sandbox_url: String,
    /// Local wall-clock ceiling per sandbox call
    pub sandbox_timeout: Duration,
    /// Compile stage limit enforced by the sandbox
    pub sandbox_compile_timeout: Duration,
    /// Run stage limit enforced by the sandbox
    pub sandbox_run_timeout: Duration,
    /// Minimum spacing between consecutive sandbox calls
    pub sandbox_min_interval: Duration,
    /// Sandbox calls in flight at once (also the per-submission test concurrency)
    pub sandbox_max_concurrency: usize,
    pub redis_url: String,
    /// Extra problem table overlaid on the built-in one
    pub problems_config: Option<String>,
    /// Serve the HTTP adapter on this address when set
    pub http_bind: Option<String>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            sandbox_url: DEFAULT_SANDBOX_URL.to_string(),
            sandbox_timeout: Duration::from_millis(DEFAULT_SANDBOX_TIMEOUT_MS),
            sandbox_compile_timeout: Duration::from_millis(DEFAULT_SANDBOX_COMPILE_TIMEOUT_MS),
            sandbox_run_timeout: Duration::from_millis(DEFAULT_SANDBOX_RUN_TIMEOUT_MS),
            sandbox_min_interval: Duration::from_millis(DEFAULT_SANDBOX_MIN_INTERVAL_MS),
            sandbox_max_concurrency: DEFAULT_SANDBOX_MAX_CONCURRENCY,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            problems_config: None,
            http_bind: None,
        }
    }
}

impl JudgeConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (process env in production, a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match non_empty(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .with_context(|| format!("{} must be a number of milliseconds", key)),
                None => Ok(default),
            }
        };

        let sandbox_max_concurrency = match non_empty("SANDBOX_MAX_CONCURRENCY") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .context("SANDBOX_MAX_CONCURRENCY must be a positive integer")?
                .max(1),
            None => defaults.sandbox_max_concurrency,
        };

        Ok(Self {
            sandbox_url: non_empty("SANDBOX_URL").unwrap_or(defaults.sandbox_url),
            sandbox_timeout: millis("SANDBOX_TIMEOUT_MS", defaults.sandbox_timeout)?,
            sandbox_compile_timeout: millis(
                "SANDBOX_COMPILE_TIMEOUT_MS",
                defaults.sandbox_compile_timeout,
            )?,
            sandbox_run_timeout: millis("SANDBOX_RUN_TIMEOUT_MS", defaults.sandbox_run_timeout)?,
            sandbox_min_interval: millis("SANDBOX_MIN_INTERVAL_MS", defaults.sandbox_min_interval)?,
            sandbox_max_concurrency,
            redis_url: non_empty("REDIS_URL").unwrap_or(defaults.redis_url),
            problems_config: non_empty("PROBLEMS_CONFIG"),
            http_bind: non_empty("HTTP_BIND"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<JudgeConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        JudgeConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, JudgeConfig::default());
        assert_eq!(config.sandbox_min_interval, Duration::from_millis(250));
        assert_eq!(config.sandbox_run_timeout, Duration::from_secs(3));
        assert!(config.http_bind.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SANDBOX_URL", "http://localhost:2000/api/v2"),
            ("SANDBOX_TIMEOUT_MS", "5000"),
            ("SANDBOX_RUN_TIMEOUT_MS", "1500"),
            ("SANDBOX_MAX_CONCURRENCY", "0"),
            ("PROBLEMS_CONFIG", "/etc/problems.toml"),
            ("HTTP_BIND", ""),
        ])
        .unwrap();
        assert_eq!(config.sandbox_url, "http://localhost:2000/api/v2");
        assert_eq!(config.sandbox_timeout, Duration::from_secs(5));
        assert_eq!(config.sandbox_run_timeout, Duration::from_millis(1500));
        assert_eq!(config.sandbox_compile_timeout, Duration::from_secs(10));
        assert_eq!(config.sandbox_max_concurrency, 1);
        assert_eq!(config.problems_config.as_deref(), Some("/etc/problems.toml"));
        assert!(config.http_bind.is_none());
    }

    #[test]
    fn test_invalid_number_rejected() {
        assert!(config_from(&[("SANDBOX_TIMEOUT_MS", "soon")]).is_err());
    }
}
