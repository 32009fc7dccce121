use crate::error::{PulseError, Result};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub api: ApiServerConfig,
    /// Publisher credential
    pub auth: AuthConfig,
    /// Subscriber stream configuration
    pub stream: StreamConfig,
    /// Dashboard page configuration
    pub dashboard: DashboardConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port for the HTTP server (default: 3000)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Allowed CORS origins (comma-separated, empty = any origin)
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret expected in the `apiKey` header. `None` rejects every publish.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Hard ceiling on a subscriber connection, measured from connect time
    pub max_lifetime_secs: u64,
    /// Per-subscriber frame buffer
    pub buffer_size: usize,
    /// Interval between SSE keep-alive comments
    pub keepalive_secs: u64,
}

impl StreamConfig {
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_lifetime_secs: 300,
            buffer_size: 256,
            keepalive_secs: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Number of rows the dashboard keeps before evicting the oldest
    pub max_messages: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { max_messages: 20 }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = get_env_or("API_KEY", "");

        Ok(Config {
            api: ApiServerConfig {
                port: get_env_or("API_PORT", "3000").parse().map_err(|_| {
                    PulseError::InvalidConfig("API_PORT must be a valid port number".into())
                })?,
                host: get_env_or("API_HOST", "0.0.0.0"),
                cors_origins: get_env_or("CORS_ORIGINS", "")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            auth: AuthConfig {
                api_key: if api_key.is_empty() { None } else { Some(api_key) },
            },
            stream: StreamConfig {
                max_lifetime_secs: get_env_or("STREAM_MAX_LIFETIME_SECS", "300")
                    .parse()
                    .map_err(|_| {
                        PulseError::InvalidConfig(
                            "STREAM_MAX_LIFETIME_SECS must be a valid number".into(),
                        )
                    })?,
                buffer_size: parse_positive("STREAM_BUFFER_SIZE", "256")?,
                keepalive_secs: get_env_or("STREAM_KEEPALIVE_SECS", "15")
                    .parse()
                    .map_err(|_| {
                        PulseError::InvalidConfig(
                            "STREAM_KEEPALIVE_SECS must be a valid number".into(),
                        )
                    })?,
            },
            dashboard: DashboardConfig {
                max_messages: parse_positive("DASHBOARD_MAX_MESSAGES", "20")?,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the HTTP server address
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Parse a non-zero count from the environment
fn parse_positive(key: &str, default: &str) -> Result<usize> {
    match get_env_or(key, default).parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PulseError::InvalidConfig(format!(
            "{} must be a positive number",
            key
        ))),
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
