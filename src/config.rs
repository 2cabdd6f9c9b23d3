//! Console configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.dp.qlink.in/api/v1";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL '{0}' (expected http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("poll interval must be at least one second")]
    ZeroPollInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub timeouts: HttpTimeouts,
    pub token_ttl: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeouts: HttpTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        }
    }
}

impl ConsoleConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CAMPAIGN_API_BASE_URL`: backend API root, default `https://api.dp.qlink.in/api/v1`
    /// - `CAMPAIGN_POLL_INTERVAL_SECS`: stats refresh period, default 60
    /// - `CAMPAIGN_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CAMPAIGN_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CAMPAIGN_TOKEN_TTL_SECS`: lifetime of a login token, default 3600
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or the poll interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("CAMPAIGN_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let config = Self {
            base_url,
            poll_interval: Duration::from_secs(env_parse("CAMPAIGN_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)),
            timeouts: HttpTimeouts {
                request_secs: env_parse("CAMPAIGN_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("CAMPAIGN_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            token_ttl: Duration::from_secs(env_parse("CAMPAIGN_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)),
        };
        config.validated()
    }

    /// Replace the base URL, e.g. from a command line flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the new URL is not http(s).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        base_url.clone_into(&mut self.base_url);
        self.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url));
        }
        self.base_url = trimmed.to_owned();
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(self)
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
