//! Chat Hub Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p chat-hub
//! ```
//!
//! Configuration is loaded from environment variables.

use chat_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so it is loaded before tracing
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_format(config.log.format)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        address = %config.hub.address(),
        "Starting Chat Hub Server..."
    );

    // Run the hub server
    if let Err(e) = chat_hub::run(config).await {
        error!(error = %e, code = e.error_code(), "Hub failed");
        std::process::exit(1);
    }
}
