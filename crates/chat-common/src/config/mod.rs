//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, HubLimits, LogConfig, LogFormat, ServerConfig,
    StaticConfig,
};
