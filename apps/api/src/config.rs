use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which backing store holds the per-client usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterBackend {
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if the API credential is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub redis_url: String,
    pub counter_backend: CounterBackend,
    pub rate_limit_max: i64,
    pub rate_limit_window: Duration,
    pub upstream_timeout: Duration,
    pub port: u16,
    pub environment: String,
    pub static_dir: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                if std::env::var("GOOGLE_APPLICATION_CREDENTIALS").is_ok() {
                    bail!(
                        "GOOGLE_APPLICATION_CREDENTIALS is set but service-account auth is not \
                         supported; set GEMINI_API_KEY instead"
                    );
                }
                bail!("Required environment variable 'GEMINI_API_KEY' is not set");
            }
        };

        let redis_url = match std::env::var("REDIS_URL") {
            Ok(url) => url,
            Err(_) => redis_url_from_parts(
                &env_or("REDIS_ADDR", "localhost:6379"),
                &env_or("REDIS_PASSWORD", ""),
            ),
        };

        Ok(Config {
            gemini_api_key,
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            redis_url,
            counter_backend: parse_backend(&env_or("RATE_LIMIT_STORE", "redis"))?,
            rate_limit_max: env_or("RATE_LIMIT_MAX", "3")
                .parse::<i64>()
                .context("RATE_LIMIT_MAX must be an integer")?,
            rate_limit_window: Duration::from_secs(
                env_or("RATE_LIMIT_WINDOW_SECS", "86400")
                    .parse::<u64>()
                    .context("RATE_LIMIT_WINDOW_SECS must be a number of seconds")?,
            ),
            upstream_timeout: Duration::from_secs(
                env_or("UPSTREAM_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("UPSTREAM_TIMEOUT_SECS must be a number of seconds")?,
            ),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            environment: env_or("ENVIRONMENT", "development"),
            static_dir: env_or("STATIC_DIR", "./static"),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Builds a `redis://` URL from a `host:port` address and an optional password.
fn redis_url_from_parts(addr: &str, password: &str) -> String {
    if password.is_empty() {
        format!("redis://{addr}/0")
    } else {
        format!("redis://:{password}@{addr}/0")
    }
}

fn parse_backend(value: &str) -> Result<CounterBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "redis" => Ok(CounterBackend::Redis),
        "memory" => Ok(CounterBackend::Memory),
        other => bail!("RATE_LIMIT_STORE must be 'redis' or 'memory', got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_url_without_password() {
        assert_eq!(
            redis_url_from_parts("localhost:6379", ""),
            "redis://localhost:6379/0"
        );
    }

    #[test]
    fn test_redis_url_with_password() {
        assert_eq!(
            redis_url_from_parts("cache.internal:6380", "s3cret"),
            "redis://:s3cret@cache.internal:6380/0"
        );
    }

    #[test]
    fn test_parse_backend_accepts_known_values() {
        assert_eq!(parse_backend("redis").unwrap(), CounterBackend::Redis);
        assert_eq!(parse_backend(" Memory ").unwrap(), CounterBackend::Memory);
    }

    #[test]
    fn test_parse_backend_rejects_unknown() {
        assert!(parse_backend("cookie").is_err());
    }
}
