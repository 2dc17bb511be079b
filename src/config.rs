//! Environment-driven configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 20;
pub const DEFAULT_MAX_POLL_DURATION: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deployment environment name (`ENVIRONMENT`, default `sandbox`)
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn is_production() -> bool {
    matches!(get_environment().as_str(), "production" | "prod")
}

/// Base URL of the report backend (`REPORTS_API_URL`)
pub fn get_api_url() -> String {
    env::var("REPORTS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}

/// Timing and decoding policy for the progress poller
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub retry_interval: Duration,
    pub max_consecutive_failures: usize,
    pub max_duration: Duration,
    /// Treat unrecognised response shapes as fatal instead of retrying them
    pub strict_decoding: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            max_duration: DEFAULT_MAX_POLL_DURATION,
            strict_decoding: true,
        }
    }
}

impl PollerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: parse_var("POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            retry_interval: parse_var("POLL_RETRY_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_interval),
            max_consecutive_failures: parse_var("POLL_MAX_CONSECUTIVE_FAILURES")
                .unwrap_or(defaults.max_consecutive_failures),
            max_duration: parse_var("POLL_MAX_DURATION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_duration),
            strict_decoding: parse_var("STRICT_DECODING").unwrap_or(!is_production()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_max_consecutive_failures(mut self, max: usize) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_strict_decoding(mut self, strict: bool) -> Self {
        self.strict_decoding = strict;
        self
    }
}

/// Full tracker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub poller: PollerConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poller: PollerConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: get_api_url(),
            request_timeout: parse_var("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            poller: PollerConfig::from_env(),
        }
    }
}
