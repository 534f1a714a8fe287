//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub hub: ServerConfig,
    pub limits: HubLimits,
    pub static_files: StaticConfig,
    pub log: LogConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
}

/// Hub server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Route the WebSocket endpoint is mounted at
    #[serde(default = "default_hub_path")]
    pub path: String,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resource limits and timing for the broadcast hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HubLimits {
    /// Connections admitted before `Connect` reports exhaustion
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Per-connection outbound queue depth
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Longest chat message accepted, in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Heartbeat interval advertised to clients
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Silence after which the transport drops a connection
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for HubLimits {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            outbound_buffer: default_outbound_buffer(),
            max_message_length: default_max_message_length(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

/// Static asset serving
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticConfig {
    /// Directory served as the fallback route; disabled when unset
    #[serde(default)]
    pub dir: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue("LOG_FORMAT", other.to_string())),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

// Default value functions
fn default_app_name() -> String {
    "chat-hub".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_hub_path() -> String {
    "/chathub".to_string()
}

fn default_max_connections() -> usize {
    10_000
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_message_length() -> usize {
    4096
}

fn default_heartbeat_interval_ms() -> u64 {
    15_000
}

fn default_idle_timeout_ms() -> u64 {
    45_000
}

/// Parse an optional variable, falling back to `default` when it is unset
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let hub_path = lookup("HUB_PATH").unwrap_or_else(default_hub_path);
        if !hub_path.starts_with('/') {
            return Err(ConfigError::InvalidValue("HUB_PATH", hub_path));
        }

        let limits = HubLimits {
            max_connections: parse_or(&lookup, "HUB_MAX_CONNECTIONS", default_max_connections())?,
            outbound_buffer: parse_or(&lookup, "HUB_OUTBOUND_BUFFER", default_outbound_buffer())?,
            max_message_length: parse_or(
                &lookup,
                "HUB_MAX_MESSAGE_LENGTH",
                default_max_message_length(),
            )?,
            heartbeat_interval_ms: parse_or(
                &lookup,
                "HUB_HEARTBEAT_INTERVAL_MS",
                default_heartbeat_interval_ms(),
            )?,
            idle_timeout_ms: parse_or(&lookup, "HUB_IDLE_TIMEOUT_MS", default_idle_timeout_ms())?,
        };

        if limits.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue("HUB_OUTBOUND_BUFFER", "0".to_string()));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
            },
            hub: ServerConfig {
                host: lookup("HUB_HOST").unwrap_or_else(default_host),
                port: parse_or(&lookup, "HUB_PORT", default_port())?,
                path: hub_path,
            },
            limits,
            static_files: StaticConfig {
                dir: lookup("STATIC_DIR").filter(|s| !s.trim().is_empty()),
            },
            log: LogConfig {
                format: lookup("LOG_FORMAT")
                    .map(|s| s.parse::<LogFormat>())
                    .transpose()?
                    .unwrap_or_default(),
            },
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
            },
            hub: ServerConfig {
                host: default_host(),
                port: default_port(),
                path: default_hub_path(),
            },
            limits: HubLimits::default(),
            static_files: StaticConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
