//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::bus::DEFAULT_CHANNEL;

/// Cache key prefix used when none is configured
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "telefono:imei:";

/// Upper bound on the cache calls one request makes one after another: the
/// uniqueness lookup (get, populate) plus fencing the previous and the new IMEI.
pub const MAX_CACHE_CALLS_PER_REQUEST: u64 = 4;

/// Most bus publishes a single request makes one after another.
pub const MAX_BUS_CALLS_PER_REQUEST: u64 = 2;

// == Config Error ==
/// Rejected configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The cache and bus calls of one request do not fit inside its budget
    #[error(
        "cache and bus timeouts of one request add up to {worst_case} ms, \
         which must be shorter than REQUEST_TIMEOUT_MS ({request} ms)"
    )]
    TimeoutBudget { worst_case: u64, request: u64 },

    /// A value that must be positive is zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Prefix prepended to the IMEI to form the cache key
    pub cache_key_prefix: String,
    /// Channel invalidation events are published to
    pub invalidation_channel: String,
    /// Upper bound for one cache call, in milliseconds
    pub cache_timeout_ms: u64,
    /// Upper bound for one bus publish, in milliseconds
    pub bus_timeout_ms: u64,
    /// Upper bound for a whole HTTP request, in milliseconds
    pub request_timeout_ms: u64,
    /// Refuse cache populations older than the last invalidation
    pub version_fencing: bool,
    /// Attempts the retry task makes before abandoning an invalidation
    pub retry_max_attempts: u32,
    /// Base backoff between retry attempts, in milliseconds
    pub retry_backoff_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_KEY_PREFIX` - Cache key prefix (default: "telefono:imei:")
    /// - `INVALIDATION_CHANNEL` - Invalidation channel (default: "device-cache-invalidation")
    /// - `CACHE_TIMEOUT_MS` - Cache call bound (default: 200)
    /// - `BUS_TIMEOUT_MS` - Bus publish bound (default: 200)
    /// - `REQUEST_TIMEOUT_MS` - HTTP request bound (default: 5000)
    /// - `VERSION_FENCING` - Reject stale cache populations (default: true)
    /// - `RETRY_MAX_ATTEMPTS` - Invalidation retry attempts (default: 5)
    /// - `RETRY_BACKOFF_MS` - Base retry backoff (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_key_prefix: env_or("CACHE_KEY_PREFIX", defaults.cache_key_prefix),
            invalidation_channel: env_or("INVALIDATION_CHANNEL", defaults.invalidation_channel),
            cache_timeout_ms: env_or("CACHE_TIMEOUT_MS", defaults.cache_timeout_ms),
            bus_timeout_ms: env_or("BUS_TIMEOUT_MS", defaults.bus_timeout_ms),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            version_fencing: env_or("VERSION_FENCING", defaults.version_fencing),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_backoff_ms: env_or("RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
        }
    }

    /// Checks that every cache and bus call of one request, timing out one
    /// after another, still finishes inside the request budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Zero("REQUEST_TIMEOUT_MS"));
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::Zero("RETRY_MAX_ATTEMPTS"));
        }

        let worst_case = self.worst_case_side_calls_ms();
        if worst_case >= self.request_timeout_ms {
            return Err(ConfigError::TimeoutBudget {
                worst_case,
                request: self.request_timeout_ms,
            });
        }
        Ok(())
    }

    /// Time one request can spend on cache and bus calls that all time out.
    pub fn worst_case_side_calls_ms(&self) -> u64 {
        self.cache_timeout_ms
            .saturating_mul(MAX_CACHE_CALLS_PER_REQUEST)
            .saturating_add(self.bus_timeout_ms.saturating_mul(MAX_BUS_CALLS_PER_REQUEST))
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.bus_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
            invalidation_channel: DEFAULT_CHANNEL.to_string(),
            cache_timeout_ms: 200,
            bus_timeout_ms: 200,
            request_timeout_ms: 5000,
            version_fencing: true,
            retry_max_attempts: 5,
            retry_backoff_ms: 100,
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_key_prefix, "telefono:imei:");
        assert_eq!(config.invalidation_channel, "device-cache-invalidation");
        assert!(config.version_fencing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("BUS_TIMEOUT_MS", "75");
        env::set_var("VERSION_FENCING", "false");
        env::set_var("RETRY_MAX_ATTEMPTS", "not a number");

        let config = Config::from_env();
        assert_eq!(config.bus_timeout_ms, 75);
        assert!(!config.version_fencing);
        assert_eq!(config.retry_max_attempts, 5);

        env::remove_var("BUS_TIMEOUT_MS");
        env::remove_var("VERSION_FENCING");
        env::remove_var("RETRY_MAX_ATTEMPTS");

        let config = Config::from_env();
        assert_eq!(config.bus_timeout_ms, 200);
        assert!(config.version_fencing);
    }

    #[test]
    fn test_validate_rejects_cache_timeout_over_budget() {
        let config = Config {
            cache_timeout_ms: 5000,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimeoutBudget {
                worst_case: 20_400,
                request: 5000,
            })
        );
    }

    #[test]
    fn test_validate_counts_sequential_calls() {
        // Each call fits on its own, their sum does not
        let config = Config {
            cache_timeout_ms: 600,
            bus_timeout_ms: 600,
            request_timeout_ms: 1000,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimeoutBudget {
                worst_case: 3600,
                request: 1000,
            })
        );

        let config = Config {
            cache_timeout_ms: 100,
            bus_timeout_ms: 100,
            request_timeout_ms: 1000,
            ..Config::default()
        };
        assert_eq!(config.worst_case_side_calls_ms(), 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_survives_huge_timeouts() {
        let config = Config {
            cache_timeout_ms: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.worst_case_side_calls_ms(), u64::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = Config {
            retry_max_attempts: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("RETRY_MAX_ATTEMPTS")));
    }
}
